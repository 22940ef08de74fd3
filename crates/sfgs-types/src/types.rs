//! Common types used throughout the SFGS mailer.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::SystemTime;

pub const SECONDS_PER_DAY: i64 = 86_400;

// Timestamp //
//***********//
/// Unix timestamp in seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(res.as_secs() as i64)
	}

	pub fn from_now(seconds: i64) -> Timestamp {
		Self::now().add_seconds(seconds)
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0 + seconds)
	}

	/// Minutes elapsed since `earlier` (negative if `earlier` is in the future)
	pub fn minutes_since(&self, earlier: Timestamp) -> f64 {
		(self.0 - earlier.0) as f64 / 60.0
	}

	pub fn to_utc(self) -> DateTime<Utc> {
		DateTime::<Utc>::from_timestamp(self.0, 0).unwrap_or_default()
	}

	/// Calendar date of this instant in the given local offset
	pub fn local_date(self, offset: FixedOffset) -> NaiveDate {
		self.to_utc().with_timezone(&offset).date_naive()
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

// DayBounds //
//***********//
/// A local calendar day as a half-open timestamp range `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayBounds {
	pub date: NaiveDate,
	pub start: Timestamp,
	pub end: Timestamp,
}

impl DayBounds {
	/// The local day (local midnight to local midnight) containing `ts`
	pub fn containing(ts: Timestamp, offset: FixedOffset) -> Self {
		let date = ts.local_date(offset);
		let start = date.and_time(NaiveTime::MIN).and_utc().timestamp()
			- i64::from(offset.local_minus_utc());
		Self { date, start: Timestamp(start), end: Timestamp(start + SECONDS_PER_DAY) }
	}

	pub fn contains(&self, ts: Timestamp) -> bool {
		ts >= self.start && ts < self.end
	}
}

// Patch //
//*******//
/// Tri-state field for partial updates: absent, explicitly null, or a value
///
/// Use with `#[serde(default)]` so that missing fields become `Undefined`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Patch<T> {
	#[default]
	Undefined,
	Null,
	Value(T),
}

impl<T> Patch<T> {
	pub fn is_undefined(&self) -> bool {
		matches!(self, Patch::Undefined)
	}

	pub fn value(&self) -> Option<&T> {
		match self {
			Patch::Value(v) => Some(v),
			_ => None,
		}
	}
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
	T: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<T>::deserialize(deserializer)?.map_or(Patch::Null, Patch::Value))
	}
}


// vim: ts=4

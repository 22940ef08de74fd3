//! Dispatch settings normalization and validation

use sfgs_types::queue::{
	DEFAULT_DAILY_EMAIL_LIMIT, DEFAULT_EMAIL_BATCH_SIZE, DispatchSettings, SettingsPatch,
};

use crate::prelude::*;

/// One week
pub const MAX_EMAIL_INTERVAL_MINUTES: i64 = 7 * 24 * 60;

/// Settings the dispatcher actually runs with
///
/// A missing record yields the defaults. Non-positive limit or batch size fall
/// back to their defaults, a negative interval means "no interval".
pub fn effective(stored: Option<DispatchSettings>) -> DispatchSettings {
	let Some(mut settings) = stored else {
		return DispatchSettings::default();
	};
	if settings.daily_email_limit <= 0 {
		settings.daily_email_limit = DEFAULT_DAILY_EMAIL_LIMIT;
	}
	if settings.email_batch_size <= 0 {
		settings.email_batch_size = DEFAULT_EMAIL_BATCH_SIZE;
	}
	settings.email_interval_minutes =
		settings.email_interval_minutes.clamp(0, MAX_EMAIL_INTERVAL_MINUTES);
	settings
}

/// Applies an operator update on top of `current`, producing the next version
pub fn apply_patch(current: &DispatchSettings, patch: &SettingsPatch) -> SfResult<DispatchSettings> {
	fn field<T: Copy>(name: &str, current: T, patch: &Patch<T>) -> SfResult<T> {
		match patch {
			Patch::Undefined => Ok(current),
			Patch::Null => Err(Error::ValidationError(format!("{} cannot be null", name))),
			Patch::Value(v) => Ok(*v),
		}
	}

	let next = DispatchSettings {
		daily_email_limit: field("dailyEmailLimit", current.daily_email_limit, &patch.daily_email_limit)?,
		email_batch_size: field("emailBatchSize", current.email_batch_size, &patch.email_batch_size)?,
		email_interval_minutes: field(
			"emailIntervalMinutes",
			current.email_interval_minutes,
			&patch.email_interval_minutes,
		)?,
		cron_enabled: field("cronEnabled", current.cron_enabled, &patch.cron_enabled)?,
		updated_at: None,
	};

	if next.daily_email_limit < 0 {
		return Err(Error::ValidationError("dailyEmailLimit must be at least 0".into()));
	}
	if next.email_batch_size < 1 {
		return Err(Error::ValidationError("emailBatchSize must be at least 1".into()));
	}
	if !(0..=MAX_EMAIL_INTERVAL_MINUTES).contains(&next.email_interval_minutes) {
		return Err(Error::ValidationError(format!(
			"emailIntervalMinutes must be between 0 and {}",
			MAX_EMAIL_INTERVAL_MINUTES
		)));
	}

	Ok(next)
}


// vim: ts=4

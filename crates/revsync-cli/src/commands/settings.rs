use revsync_core::config::AppConfig;
use revsync_core::db::SettingsRepository;
use revsync_core::schedule;
use revsync_core::util::{normalize_text_option, unix_timestamp_now};
use revsync_core::SyncFrequency;

use crate::commands::common::{
    format_next_sync, format_settings_lines, open_service, settings_view,
};
use crate::error::CliError;

pub async fn run_settings_show(as_json: bool, config: &AppConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let settings = service.load().await?;
    let next_sync = schedule::next_run(&service).await?;
    let view = settings_view(&settings, next_sync);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for line in format_settings_lines(&view, settings.frequency.label()) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Save the changed fields, then reschedule from the saved settings.
pub async fn run_settings_set(
    api_key: Option<String>,
    place_id: Option<String>,
    frequency: Option<SyncFrequency>,
    config: &AppConfig,
) -> Result<(), CliError> {
    if api_key.is_none() && place_id.is_none() && frequency.is_none() {
        return Err(CliError::NothingToUpdate);
    }

    let service = open_service(config).await?;
    let mut settings = service.load().await?;

    if let Some(value) = api_key {
        settings.api_key = normalize_text_option(Some(value));
    }
    if let Some(value) = place_id {
        settings.place_id = normalize_text_option(Some(value));
    }
    if let Some(value) = frequency {
        settings.frequency = value;
    }

    service.save(&settings).await?;
    println!("Settings saved");

    let scheduled = schedule::reschedule(&service, &settings, unix_timestamp_now()).await?;
    println!("{}", format_next_sync(scheduled));
    Ok(())
}

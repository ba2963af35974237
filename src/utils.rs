use crate::network::Timestamp;

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Invalid time {0:?}, expected HH:MM:SS.")]
pub struct ParseTimeError(pub String);

/// Parses "HH:MM:SS" into seconds since midnight. Hours may exceed 23 for trips running past midnight.
pub fn parse_time(s: &str) -> Result<Timestamp, ParseTimeError> {
    let invalid = || ParseTimeError(s.to_owned());
    let mut parts = s.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    if hours.is_empty() || minutes.len() != 2 || seconds.len() != 2 {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

pub fn get_time_str(time: Timestamp) -> String {
    let hours = time / 3600;
    let minutes = (time % 3600) / 60;
    let seconds = time % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

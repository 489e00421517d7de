use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// 24-hour or 12-hour clock face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24")]
    H24,
    #[serde(rename = "12")]
    H12,
}

/// `HH:MM:SS`, or `hh:MM:SS AM` for the 12-hour face
pub fn format_time(time: NaiveTime, format: TimeFormat) -> String {
    format_time_with(time, format, true)
}

/// Like [`format_time`] with the seconds field optional
pub fn format_time_with(time: NaiveTime, format: TimeFormat, seconds: bool) -> String {
    let (hour, suffix) = match format {
        TimeFormat::H24 => (time.hour(), None),
        TimeFormat::H12 => {
            let (pm, hour) = time.hour12();
            (hour, Some(if pm { "PM" } else { "AM" }))
        }
    };
    let mut out = format!("{hour:02}:{:02}", time.minute());
    if seconds {
        out.push_str(&format!(":{:02}", time.second()));
    }
    if let Some(suffix) = suffix {
        out.push(' ');
        out.push_str(suffix);
    }
    out
}

/// Small faces sit slightly high when centred on the panel midline
pub fn vertical_nudge(size: f32) -> i32 {
    if size <= 15.0 {
        -2
    } else if size <= 20.0 {
        -1
    } else {
        0
    }
}

/// Top-left corner for a `w`x`h` clock bitmap on a `pw`x`ph` panel
pub fn clock_origin(pw: u32, ph: u32, w: u32, h: u32, size: f32) -> (i32, i32) {
    let x = (pw as i32 - w as i32).div_euclid(2);
    let mid = (ph / 2) as i32 + vertical_nudge(size);
    (x, mid - (h / 2) as i32)
}

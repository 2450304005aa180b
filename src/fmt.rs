use chrono::{DateTime, Utc};

/// Human-readable file size: 512 B, 1.5 KB, 2.0 MB
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Cursor as shown to the user; the epoch means nothing has been synced yet.
pub fn format_cursor(cursor: DateTime<Utc>) -> String {
    if cursor.timestamp() == 0 {
        "(never synced)".to_string()
    } else {
        cursor.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

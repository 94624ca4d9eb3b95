//! `LIST` output parsing.
//!
//! `LIST` has no standard format. Two dialects cover nearly every server:
//!
//! ```text
//! -rw-r--r--   1 ftp  ftp      12 Sep 13 12:26 hello world.txt
//! drwxr-xr-x   2 ftp  ftp    4096 Jan  2  2019 pub
//! 09-13-20  12:26PM                12 hello.txt
//! 01-02-19  08:00AM       <DIR>          pub
//! ```
//!
//! Lines in neither shape are skipped.

use chrono::{DateTime, Datelike, Duration, Month, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ftpvfs::{EntryKind, RemoteEntry};
use std::time::SystemTime;

/// Parse a whole `LIST` response.
///
/// `now` anchors Unix timestamps that omit the year.
pub fn parse_listing(text: &str, now: DateTime<Utc>) -> Vec<RemoteEntry> {
    text.lines()
        .filter_map(|line| {
            let entry = parse_line(line, now);
            if entry.is_none() && !is_noise(line) {
                tracing::debug!(line, "skipping unparseable LIST line");
            }
            entry
        })
        .filter(|entry| entry.name != "." && entry.name != "..")
        .collect()
}

/// Parse one `LIST` line in either dialect.
pub fn parse_line(line: &str, now: DateTime<Utc>) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    if is_noise(line) {
        return None;
    }
    parse_unix(line, now).or_else(|| parse_dos(line))
}

fn is_noise(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("total ")
}

/// Whitespace-separated fields with their byte offsets.
fn fields(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

fn parse_unix(line: &str, now: DateTime<Utc>) -> Option<RemoteEntry> {
    let kind = match line.as_bytes().first()? {
        b'd' => EntryKind::Directory,
        b'l' => EntryKind::Link,
        b'-' => EntryKind::File,
        _ => return None,
    };

    let fields = fields(line);
    // perms, then owner/group columns of varying count, then size and the
    // three date fields. The month is the anchor.
    let month_at = (2..fields.len().saturating_sub(3)).find(|&i| {
        fields[i].1.parse::<Month>().is_ok() && fields[i - 1].1.parse::<u64>().is_ok()
    })?;

    let size: u64 = fields[month_at - 1].1.parse().ok()?;
    let modified = unix_timestamp(
        fields[month_at].1,
        fields[month_at + 1].1,
        fields[month_at + 2].1,
        now,
    );

    let mut name = &line[fields[month_at + 3].0..];
    if kind == EntryKind::Link
        && let Some(arrow) = name.find(" -> ")
    {
        name = &name[..arrow];
    }

    Some(RemoteEntry {
        name: name.to_string(),
        size,
        modified,
        kind,
    })
}

/// `Mon DD HH:MM` (within the last year) or `Mon DD YYYY`.
fn unix_timestamp(
    month: &str,
    day: &str,
    time_or_year: &str,
    now: DateTime<Utc>,
) -> Option<SystemTime> {
    let month = month.parse::<Month>().ok()?.number_from_month();
    let day: u32 = day.parse().ok()?;

    let stamp = if let Some((h, m)) = time_or_year.split_once(':') {
        let time = NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)?;
        let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?.and_time(time);
        // A date ahead of now belongs to last year. Allow a day of clock skew.
        if this_year.and_utc() > now + Duration::days(1) {
            NaiveDate::from_ymd_opt(now.year() - 1, month, day)?.and_time(time)
        } else {
            this_year
        }
    } else {
        NaiveDate::from_ymd_opt(time_or_year.parse().ok()?, month, day)?.and_hms_opt(0, 0, 0)?
    };

    Some(stamp.and_utc().into())
}

fn parse_dos(line: &str) -> Option<RemoteEntry> {
    let fields = fields(line);
    if fields.len() < 4 {
        return None;
    }

    let date = dos_date(fields[0].1)?;
    let time = dos_time(fields[1].1)?;
    let (kind, size) = match fields[2].1 {
        "<DIR>" => (EntryKind::Directory, 0),
        size => (EntryKind::File, size.parse().ok()?),
    };

    Some(RemoteEntry {
        name: line[fields[3].0..].to_string(),
        size,
        modified: Some(NaiveDateTime::new(date, time).and_utc().into()),
        kind,
    })
}

/// `MM-DD-YY` or `MM-DD-YYYY`. Two-digit years before 70 are 20xx.
fn dos_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year_text = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let year: i32 = year_text.parse().ok()?;
    let year = match year_text.len() {
        2 if year < 70 => 2000 + year,
        2 => 1900 + year,
        4 => year,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `HH:MMAM`, `HH:MMPM` or 24-hour `HH:MM`.
fn dos_time(s: &str) -> Option<NaiveTime> {
    let upper = s.to_ascii_uppercase();
    let (clock, pm) = if let Some(clock) = upper.strip_suffix("PM") {
        (clock, Some(true))
    } else if let Some(clock) = upper.strip_suffix("AM") {
        (clock, Some(false))
    } else {
        (upper.as_str(), None)
    };

    let (h, m) = clock.split_once(':')?;
    let mut hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if let Some(pm) = pm {
        if hour == 0 || hour > 12 {
            return None;
        }
        hour %= 12;
        if pm {
            hour += 12;
        }
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<SystemTime> {
        Some(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap().into())
    }

    #[test]
    fn test_unix_file() {
        let entry =
            parse_line("-rw-r--r--   1 ftp  ftp      12 Feb 13 12:26 a.txt", now()).unwrap();
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.size, 12);
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.modified, at(2024, 2, 13, 12, 26));
    }

    #[test]
    fn test_unix_future_date_is_last_year() {
        let entry = parse_line("-rw-r--r--   1 ftp  ftp  7 Dec 24 18:00 gift", now()).unwrap();
        assert_eq!(entry.modified, at(2023, 12, 24, 18, 0));
    }

    #[test]
    fn test_unix_directory_with_year() {
        let entry = parse_line("drwxr-xr-x   2 ftp  ftp    4096 Jan  2  2019 pub", now()).unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name, "pub");
        assert_eq!(entry.modified, at(2019, 1, 2, 0, 0));
    }

    #[test]
    fn test_unix_name_with_spaces() {
        let entry = parse_line(
            "-rw-r--r--   1 ftp  ftp   3 Mar  1 08:00 my  notes v2.txt",
            now(),
        )
        .unwrap();
        assert_eq!(entry.name, "my  notes v2.txt");
    }

    #[test]
    fn test_unix_link_drops_target() {
        let entry = parse_line(
            "lrwxrwxrwx   1 ftp  ftp   11 Mar  1 08:00 latest -> release-1.2",
            now(),
        )
        .unwrap();
        assert_eq!(entry.kind, EntryKind::Link);
        assert_eq!(entry.name, "latest");
    }

    #[test]
    fn test_unix_without_group_column() {
        let entry = parse_line("-rw-r--r--   1 ftp      12 Feb 13 12:26 a.txt", now()).unwrap();
        assert_eq!(entry.size, 12);
        assert_eq!(entry.name, "a.txt");
    }

    #[test]
    fn test_dos_entries() {
        let file = parse_line("09-13-20  12:26PM                12 hello.txt", now()).unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 12);
        assert_eq!(file.name, "hello.txt");
        assert_eq!(file.modified, at(2020, 9, 13, 12, 26));

        let dir = parse_line("01-02-1999  12:05AM       <DIR>          old stuff", now()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.name, "old stuff");
        assert_eq!(dir.modified, at(1999, 1, 2, 0, 5));
    }

    #[test]
    fn test_noise_and_garbage() {
        assert!(parse_line("total 24", now()).is_none());
        assert!(parse_line("", now()).is_none());
        assert!(parse_line("this is not a listing", now()).is_none());
    }

    #[test]
    fn test_parse_listing_keeps_order() {
        let text = "total 8\r\n\
                    drwxr-xr-x 2 ftp ftp 4096 Jan  2  2019 .\r\n\
                    drwxr-xr-x 2 ftp ftp 4096 Jan  2  2019 ..\r\n\
                    -rw-r--r-- 1 ftp ftp 5 Mar  1 08:00 zeta\r\n\
                    garbage line\r\n\
                    -rw-r--r-- 1 ftp ftp 9 Mar  1 08:00 alpha\r\n";
        let names: Vec<_> = parse_listing(text, now())
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}

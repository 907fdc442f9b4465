//! Parser for the conventional long-format directory listing returned
//! by `LIST`, one line per entry.
//!
//! Lines are scanned as eight whitespace-delimited fields anchored from
//! the left (permissions, link count, owner, group, size, month, day,
//! time or year) with everything remaining captured as the name. The
//! name is the only field that may contain spaces, so it is never
//! tokenized; owner and group are single tokens but may contain any
//! non-whitespace punctuation.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of fields before the name starts
const FIXED_FIELDS: usize = 8;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Unix mode bits decoded from the symbolic permission field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mode(u32);

bitflags! {
    impl Mode: u32 {
        const SETUID = 0o4000;
        const SETGID = 0o2000;
        const STICKY = 0o1000;
        const USER_READ = 0o400;
        const USER_WRITE = 0o200;
        const USER_EXEC = 0o100;
        const GROUP_READ = 0o40;
        const GROUP_WRITE = 0o20;
        const GROUP_EXEC = 0o10;
        const OTHER_READ = 0o4;
        const OTHER_WRITE = 0o2;
        const OTHER_EXEC = 0o1;
    }
}

/// Entry type derived from the first character of the permission field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

/// One parsed line of a long-format listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Original unparsed line
    pub raw: String,
    /// File or directory name, internal spaces preserved
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Hard link count
    pub links: u32,
    /// Owning user name
    pub owner: String,
    /// Owning group name, may contain hyphens
    pub group: String,
    /// Modification time, year inferred when the listing omits it
    pub modified: NaiveDateTime,
    /// Whole permission field, including setuid/setgid/sticky markers
    pub permissions: String,
}

impl DirectoryEntry {
    /// Returns the entry type for this line.
    ///
    /// Only the first permission character is consulted, so sticky-bit
    /// and setuid markers later in the field never change the type.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self.permissions.chars().next() {
            Some('d') => EntryKind::Directory,
            Some('l') => EntryKind::Symlink,
            Some('-') => EntryKind::Regular,
            _ => EntryKind::Other,
        }
    }

    /// Returns `true` if is a directory
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    /// Returns `true` if is a regular file
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.kind() == EntryKind::Regular
    }

    /// Returns `true` if is a symlink
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.kind() == EntryKind::Symlink
    }

    /// Decodes the nine symbolic permission characters into mode bits
    #[must_use]
    pub fn mode(&self) -> Mode {
        let mut mode = Mode::empty();

        for (i, ch) in self.permissions.chars().skip(1).take(9).enumerate() {
            let bit = Mode::from_bits_truncate(1 << (8 - i));
            match ch {
                'r' | 'w' | 'x' => mode |= bit,
                's' => {
                    mode |= bit;
                    mode |= if i == 2 { Mode::SETUID } else { Mode::SETGID };
                }
                'S' => mode |= if i == 2 { Mode::SETUID } else { Mode::SETGID },
                't' => {
                    mode |= bit;
                    mode |= Mode::STICKY;
                }
                'T' => mode |= Mode::STICKY,
                _ => (),
            }
        }

        mode
    }
}

/// Parses a whole listing payload, one entry per well-formed line.
///
/// Malformed lines (`total` headers, truncated lines, alternate
/// formats with non-numeric size fields) are skipped, never fatal.
pub fn parse(text: &str) -> Vec<DirectoryEntry> {
    parse_lines(text.lines())
}

/// Parses raw listing lines against the local clock.
pub fn parse_lines<I, S>(lines: I) -> Vec<DirectoryEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_lines_at(lines, Local::now().naive_local())
}

/// Parses raw listing lines, resolving yearless dates against `now`.
///
/// A timestamp without a year gets the year of `now` unless that would
/// place it in the future, in which case the previous year is used.
pub fn parse_lines_at<I, S>(lines: I, now: NaiveDateTime) -> Vec<DirectoryEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line, now) {
            Some(entry) => entries.push(entry),
            None => warn!("skipped listing line: {:?}", line),
        }
    }

    entries
}

/// Drops `.` and `..` entries. Opt-in: some callers need the raw
/// directory semantics, so [`parse`] never filters on its own.
#[must_use]
pub fn remove_relative_paths(entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.name != "." && entry.name != "..")
        .collect()
}

fn parse_line(line: &str, now: NaiveDateTime) -> Option<DirectoryEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (fields, name) = split_fields(line)?;
    let [permissions, links, owner, group, size, month, day, clock] = fields;

    if !is_permission_field(permissions) || name.is_empty() {
        return None;
    }

    Some(DirectoryEntry {
        raw: line.to_owned(),
        name: name.to_owned(),
        size: size.parse().ok()?,
        links: links.parse().ok()?,
        owner: owner.to_owned(),
        group: group.to_owned(),
        modified: parse_timestamp(month, day, clock, now)?,
        permissions: permissions.to_owned(),
    })
}

/// Takes [`FIXED_FIELDS`] tokens from the left and returns the
/// remainder as the name, internal whitespace untouched.
fn split_fields(line: &str) -> Option<([&str; FIXED_FIELDS], &str)> {
    let mut fields = [""; FIXED_FIELDS];
    let mut rest = line;

    for field in &mut fields {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = &rest[end..];
    }

    Some((fields, rest.trim_start()))
}

fn is_permission_field(field: &str) -> bool {
    field.len() >= 10
        && field
            .chars()
            .skip(1)
            .take(9)
            .all(|c| matches!(c, 'r' | 'w' | 'x' | 's' | 'S' | 't' | 'T' | '-'))
}

fn month_number(token: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| token.eq_ignore_ascii_case(month))
        .map(|index| index as u32 + 1)
}

/// The third token distinguishes the two layouts: one containing `:`
/// is an `HH:MM` time of a yearless date, anything else is a year.
fn parse_timestamp(month: &str, day: &str, clock: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;

    if let Some((hour, minute)) = clock.split_once(':') {
        let hour: u32 = hour.parse().ok()?;
        let minute: u32 = minute.parse().ok()?;
        let candidate = NaiveDate::from_ymd_opt(now.year(), month, day)?.and_hms_opt(hour, minute, 0)?;

        if candidate > now {
            candidate.with_year(now.year() - 1)
        } else {
            Some(candidate)
        }
    } else {
        let year: i32 = clock.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
    }
}

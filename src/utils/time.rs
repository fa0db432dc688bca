use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Characters that may not appear in a history file name.
const SEPARATORS: &[char] = &[' ', ',', ':', '/'];

/// The current time in `offset`.
pub fn now_in(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

/// Render `datetime` the way a US-English locale prints it, e.g.
/// `10/19/2026, 3:04:05 PM`.
pub fn locale_string(datetime: OffsetDateTime) -> String {
    let format = format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
    );
    datetime
        .format(&format)
        .unwrap_or_else(|_| datetime.unix_timestamp().to_string())
}

/// Replace every separator character with `-`.
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if SEPARATORS.contains(&c) { '-' } else { c })
        .collect()
}

/// The stem of a history file written at `datetime`.
pub fn history_file_stem(datetime: OffsetDateTime) -> String {
    sanitize_file_stem(&locale_string(datetime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn locale_formatting() {
        assert_eq!(
            locale_string(datetime!(2026-10-19 15:04:05 UTC)),
            "10/19/2026, 3:04:05 PM"
        );
        assert_eq!(
            locale_string(datetime!(2026-01-02 00:30:09 UTC)),
            "1/2/2026, 12:30:09 AM"
        );
    }

    #[test]
    fn stem_has_no_separators() {
        let stem = history_file_stem(datetime!(2026-10-19 15:04:05 UTC));
        assert_eq!(stem, "10-19-2026--3-04-05-PM");
        assert!(!stem.contains(SEPARATORS));
    }

    #[test]
    fn now_respects_offset() {
        let now = now_in(offset!(+2));
        assert_eq!(now.offset(), offset!(+2));
    }
}

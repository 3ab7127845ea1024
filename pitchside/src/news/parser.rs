// Best-effort parsing of `title | YYYY-MM-DD | url` lines returned by the model.

use chrono::NaiveDate;
use uuid::Uuid;

use super::prompts::PLACEHOLDER_URL;
use super::NewsItem;

/// Turn a free-text reply into news items, one per non-empty line.
///
/// Missing or empty date/url fields fall back to `today` and the placeholder
/// url; fields past the third are ignored. Leading bullets are dropped. Ordinals
/// are dropped only when the whole reply is a `1.`, `2.`, ... list, so titles
/// such as "3. Liga" or "2. Bundesliga" survive.
pub fn parse_news_lines(text: &str, today: NaiveDate) -> Vec<NewsItem> {
    let today = today.format("%Y-%m-%d").to_string();

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let numbered = is_numbered_list(&lines);

    lines
        .into_iter()
        .filter_map(|line| {
            let mut fields = line.split('|').map(str::trim);
            let first = fields.next().unwrap_or_default();
            let title = match split_ordinal(first) {
                Some((_, rest)) if numbered => rest,
                _ => strip_bullet(first),
            };
            // A line with nothing before the first `|` has no headline to show;
            // a reply made only of such lines ends up as no results.
            if title.is_empty() {
                return None;
            }
            let date = fields.next().filter(|f| !f.is_empty());
            let url = fields.next().filter(|f| !f.is_empty());

            Some(NewsItem {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                date: date.map(str::to_string).unwrap_or_else(|| today.clone()),
                url: url.unwrap_or(PLACEHOLDER_URL).to_string(),
            })
        })
        .collect()
}

/// At least two lines, numbered 1, 2, 3, ... in order.
fn is_numbered_list(lines: &[&str]) -> bool {
    lines.len() > 1
        && lines
            .iter()
            .enumerate()
            .all(|(i, line)| matches!(split_ordinal(line), Some((n, _)) if n == i + 1))
}

/// Split "3. rest" or "3) rest" into the number and the trimmed rest.
fn split_ordinal(text: &str) -> Option<(usize, &str)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = text[digits..].strip_prefix(['.', ')'])?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let n = text[..digits].parse().ok()?;
    Some((n, rest.trim_start()))
}

/// Drop a leading "- ", "* " or "•".
fn strip_bullet(title: &str) -> &str {
    if let Some(rest) = title.strip_prefix('•') {
        return rest.trim_start();
    }
    for bullet in ["- ", "* "] {
        if let Some(rest) = title.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn full_and_partial_lines() {
        let items = parse_news_lines(
            "Team A wins | 2025-03-01 | https://x.com/a\nTeam B loses",
            day(),
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Team A wins");
        assert_eq!(items[0].date, "2025-03-01");
        assert_eq!(items[0].url, "https://x.com/a");
        assert_eq!(items[1].title, "Team B loses");
        assert_eq!(items[1].date, "2025-03-14");
        assert_eq!(items[1].url, "#");
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let items = parse_news_lines("\n\n   Derby ends 2-2 |2025-01-05|   \n\r\n", day());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Derby ends 2-2");
        assert_eq!(items[0].date, "2025-01-05");
        assert_eq!(items[0].url, "#");
    }

    #[test]
    fn extra_fields_are_dropped() {
        let items = parse_news_lines("A | 2025-02-02 | https://a | surplus | more", day());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://a");
    }

    #[test]
    fn empty_date_field_defaults() {
        let items = parse_news_lines("Transfer rumour | | https://r", day());
        assert_eq!(items[0].date, "2025-03-14");
        assert_eq!(items[0].url, "https://r");
    }

    #[test]
    fn bullets_are_stripped() {
        let items = parse_news_lines("- Third | 2025-03-01 | #\n* Fourth\n• Fifth", day());
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "Fourth", "Fifth"]);
    }

    #[test]
    fn numbered_reply_drops_ordinals() {
        let items = parse_news_lines(
            "1. First | 2025-03-01 | #\n2) Second\n3. 2. Bundesliga relegation playoff",
            day(),
        );
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["First", "Second", "2. Bundesliga relegation playoff"]
        );
    }

    #[test]
    fn ordinal_headlines_keep_their_number() {
        let items = parse_news_lines(
            "3. Liga: Dynamo Dresden promoted | 2025-05-17 | #\n- 1 | 2025-01-01",
            day(),
        );
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["3. Liga: Dynamo Dresden promoted", "1"]);

        // Out of sequence, so not a numbered list.
        let items = parse_news_lines(
            "2. Bundesliga: Hamburg back up\n1. FC Köln sign a keeper\n2024 was a big year",
            day(),
        );
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "2. Bundesliga: Hamburg back up",
                "1. FC Köln sign a keeper",
                "2024 was a big year"
            ]
        );

        // A single line is never treated as a list.
        let items = parse_news_lines("1. FC Union Berlin stay up", day());
        assert_eq!(items[0].title, "1. FC Union Berlin stay up");
    }

    #[test]
    fn lines_without_title_are_skipped() {
        assert!(parse_news_lines(" | 2025-03-01 | https://x\n|||", day()).is_empty());
        assert!(parse_news_lines("", day()).is_empty());
        assert!(parse_news_lines("   \n\t\n", day()).is_empty());
    }

    #[test]
    fn random_pipe_garbage_never_panics() {
        const ALPHABET: &[char] = &[
            '|', '|', '|', ' ', ' ', '\n', '\r', '\t', '-', '*', '.', ')', '1', '9', 'a', 'Z',
            'é', '•', '#', '/', ':',
        ];
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..2_000 {
            let len = rng.gen_range(0..120);
            let text: String = (0..len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                .collect();

            let items = parse_news_lines(&text, day());

            let candidate_lines = text.lines().filter(|l| !l.trim().is_empty()).count();
            assert!(items.len() <= candidate_lines, "input: {:?}", text);
            for item in &items {
                assert!(!item.title.is_empty(), "input: {:?}", text);
                assert!(!item.title.contains('|'), "input: {:?}", text);
                assert!(!item.date.is_empty() && !item.url.is_empty(), "input: {:?}", text);
                assert_eq!(item.title, item.title.trim(), "input: {:?}", text);
            }
        }
    }
}

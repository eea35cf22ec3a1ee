//! OCRテキストからのカード名・カード番号抽出
//!
//! 抽出戦略は優先順の関数リストとして定義し、最初にSomeを返したものを採用する。
//! 複数行が同じ戦略に該当する場合は上から最初の行のみ使う（スコアリングはしない）。

use crate::types::ExtractedFields;
use regex::Regex;

/// 1つの抽出戦略
pub type Strategy = fn(&[&str]) -> Option<String>;

/// カード名として扱わない語（大文字小文字無視の部分一致）
pub const NAME_DENYLIST: &[&str] = &[
    "HP", "BASIC", "STAGE", "EVOLUTION", "POKEMON", "TRAINER", "ENERGY", "RARE", "COMMON",
    "UNCOMMON",
];

lazy_static::lazy_static! {
    // 大文字始まり、英字/空白/-'&. のみ、全体3〜25文字
    static ref NAME_PATTERN: Regex = Regex::new(r"^[A-Z][A-Za-z\s\-'&.]{2,24}$").unwrap();
    // Capitalized Words + 任意の全大文字語（例: "Mewtwo GX"）
    static ref CAPITALIZED_PATTERN: Regex =
        Regex::new(r"^[A-Z][a-z]+(?:\s[A-Z][a-z]+)*(?:\s[A-Z]+)?$").unwrap();
    static ref LETTERS_ONLY: Regex = Regex::new(r"^[A-Za-z\s\-'&.]+$").unwrap();
    static ref FALLBACK_REJECT: Regex =
        Regex::new(r"(?i)(HP|BASIC|STAGE|POKEMON|TRAINER|ENERGY|\d)").unwrap();

    static ref SLASH_NUMBER: Regex = Regex::new(r"\d+/\d+").unwrap();
    static ref BARE_NUMBER: Regex = Regex::new(r"^\s*(\d{1,3})\s*$").unwrap();
    static ref INDICATOR_NUMBER: Regex =
        Regex::new(r"(?i)(?:\bcard\s*#?|\bno\.?|#)\s*(\d+(?:/\d+)?)").unwrap();
}

/// カード名の抽出戦略（優先順）
pub const NAME_STRATEGIES: &[Strategy] = &[name_by_pattern, name_by_capitalization, name_fallback];

/// カード番号の抽出戦略（優先順）
pub const NUMBER_STRATEGIES: &[Strategy] = &[
    number_in_joined_text,
    number_in_line,
    number_standalone,
    number_after_indicator,
];

/// 生OCRテキストを行に分割（各行trim、空行除去）
pub fn split_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn is_denylisted(line: &str) -> bool {
    let upper = line.to_uppercase();
    NAME_DENYLIST.iter().any(|token| upper.contains(token))
}

/// 名前戦略1: 名前らしい書式 かつ 除外語を含まない
pub fn name_by_pattern(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| NAME_PATTERN.is_match(line) && !is_denylisted(line))
        .map(|line| line.to_string())
}

/// 名前戦略2: "Word Word CAPS" 形式、3〜20文字
pub fn name_by_capitalization(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| (3..=20).contains(&char_len(line)) && CAPITALIZED_PATTERN.is_match(line))
        .map(|line| line.to_string())
}

/// 名前戦略3: 英字のみの3〜25文字の行（推測）
pub fn name_fallback(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| {
            (3..=25).contains(&char_len(line))
                && LETTERS_ONLY.is_match(line)
                && !FALLBACK_REJECT.is_match(line)
        })
        .map(|line| line.to_string())
}

/// 番号戦略1: 全行をスペース結合したテキスト中の "123/456"
pub fn number_in_joined_text(lines: &[&str]) -> Option<String> {
    let joined = lines.join(" ");
    SLASH_NUMBER.find(&joined).map(|m| m.as_str().to_string())
}

/// 番号戦略2: 各行の "123/456"
pub fn number_in_line(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| SLASH_NUMBER.find(line).map(|m| m.as_str().to_string()))
}

/// 番号戦略3: 数字1〜3桁だけの行（1〜999）
pub fn number_standalone(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        let digits = BARE_NUMBER.captures(line)?.get(1)?.as_str();
        let value: u32 = digits.parse().ok()?;
        (1..=999).contains(&value).then(|| digits.to_string())
    })
}

/// 番号戦略4: "No." "#" "Card" などに続く数字（"/数字" 付きも可）
pub fn number_after_indicator(lines: &[&str]) -> Option<String> {
    let joined = lines.join(" ");
    INDICATOR_NUMBER
        .captures(&joined)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn first_match(strategies: &[Strategy], lines: &[&str]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(lines))
}

pub fn parse_name(lines: &[&str]) -> Option<String> {
    first_match(NAME_STRATEGIES, lines)
}

pub fn parse_card_number(lines: &[&str]) -> Option<String> {
    first_match(NUMBER_STRATEGIES, lines)
}

/// OCRテキスト全体からカード名・番号を抽出
pub fn parse_fields(raw_text: &str) -> ExtractedFields {
    let lines = split_lines(raw_text);
    ExtractedFields::new()
        .with_name(parse_name(&lines).as_deref())
        .with_card_number(parse_card_number(&lines).as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // split_lines テスト
    // =============================================

    #[test]
    fn test_split_lines_trims_and_drops_blank() {
        let lines = split_lines("  Pikachu  \n\n   \n60 HP\r\n 58/102 ");
        assert_eq!(lines, vec!["Pikachu", "60 HP", "58/102"]);
    }

    // =============================================
    // 名前抽出テスト
    // =============================================

    #[test]
    fn test_name_pattern_rejects_denylisted_basic() {
        assert_eq!(name_by_pattern(&["BASIC"]), None);
        assert_eq!(parse_name(&["BASIC"]), None);
    }

    #[test]
    fn test_name_pattern_skips_denylisted_lines() {
        let lines = ["STAGE 1", "Holo Rare", "Charizard", "120 HP"];
        assert_eq!(parse_name(&lines), Some("Charizard".to_string()));
    }

    #[test]
    fn test_name_denylist_is_substring_and_case_insensitive() {
        assert_eq!(name_by_pattern(&["Energy Switch"]), None);
        assert_eq!(name_by_pattern(&["Trainer's Mail"]), None);
        assert_eq!(name_by_pattern(&["Uncommon"]), None);
    }

    #[test]
    fn test_name_pattern_length_bounds() {
        assert_eq!(name_by_pattern(&["Ab"]), None);
        assert_eq!(name_by_pattern(&["Abc"]), Some("Abc".to_string()));
        let long = "A".to_string() + &"b".repeat(25);
        assert_eq!(name_by_pattern(&[long.as_str()]), None);
    }

    #[test]
    fn test_name_first_line_wins() {
        assert_eq!(parse_name(&["Pikachu", "Raichu"]), Some("Pikachu".to_string()));
    }

    #[test]
    fn test_name_strategy2_after_denylist() {
        // 戦略1では除外語で弾かれるが、戦略2の書式には合う
        let lines = ["Energy Retrieval"];
        assert_eq!(name_by_pattern(&lines), None);
        assert_eq!(parse_name(&lines), Some("Energy Retrieval".to_string()));
    }

    #[test]
    fn test_name_strategy2_allows_trailing_caps_word() {
        assert_eq!(
            name_by_capitalization(&["Mewtwo GX"]),
            Some("Mewtwo GX".to_string())
        );
        assert_eq!(name_by_capitalization(&["mewtwo"]), None);
    }

    #[test]
    fn test_name_fallback_lowercase_line() {
        let lines = ["60", "pikachu"];
        assert_eq!(name_by_pattern(&lines), None);
        assert_eq!(name_by_capitalization(&lines), None);
        assert_eq!(parse_name(&lines), Some("pikachu".to_string()));
    }

    #[test]
    fn test_name_fallback_rejects_digits_and_keywords() {
        assert_eq!(name_fallback(&["lv 12"]), None);
        assert_eq!(name_fallback(&["basic"]), None);
        assert_eq!(name_fallback(&["xy"]), None);
    }

    #[test]
    fn test_name_absent() {
        assert_eq!(parse_name(&["120", "4/102", "BASIC"]), None);
        assert_eq!(parse_name(&[]), None);
    }

    // =============================================
    // 番号抽出テスト
    // =============================================

    #[test]
    fn test_number_slash_in_joined_text() {
        let lines = ["Charizard", "4/102", "Holo Rare"];
        assert_eq!(number_in_joined_text(&lines), Some("4/102".to_string()));
        assert_eq!(parse_card_number(&lines), Some("4/102".to_string()));
    }

    #[test]
    fn test_number_slash_embedded_in_line() {
        let lines = ["Illus. Mitsuhiro Arita 58/102 Common"];
        assert_eq!(parse_card_number(&lines), Some("58/102".to_string()));
    }

    #[test]
    fn test_number_slash_per_line() {
        assert_eq!(number_in_line(&["abc", "x 12/34 y"]), Some("12/34".to_string()));
        assert_eq!(number_in_line(&["abc"]), None);
    }

    #[test]
    fn test_number_standalone() {
        assert_eq!(parse_card_number(&["Pikachu", "58"]), Some("58".to_string()));
    }

    #[test]
    fn test_number_standalone_rejects_four_digits() {
        assert_eq!(number_standalone(&["1000"]), None);
        assert_eq!(parse_card_number(&["1000"]), None);
    }

    #[test]
    fn test_number_standalone_rejects_zero() {
        assert_eq!(number_standalone(&["0"]), None);
        assert_eq!(number_standalone(&["000"]), None);
        assert_eq!(number_standalone(&["999"]), Some("999".to_string()));
    }

    #[test]
    fn test_number_after_indicator() {
        assert_eq!(parse_card_number(&["Card No. 25"]), Some("25".to_string()));
        assert_eq!(parse_card_number(&["#7 Promo"]), Some("7".to_string()));
        assert_eq!(parse_card_number(&["card#1234"]), Some("1234".to_string()));
        assert_eq!(parse_card_number(&["NO 44"]), Some("44".to_string()));
    }

    #[test]
    fn test_number_indicator_not_inside_word() {
        assert_eq!(number_after_indicator(&["Nosepass"]), None);
        assert_eq!(number_after_indicator(&["Casino 5"]), None);
    }

    #[test]
    fn test_number_absent() {
        assert_eq!(parse_card_number(&["Pikachu", "Lightning"]), None);
    }

    // =============================================
    // parse_fields テスト
    // =============================================

    #[test]
    fn test_parse_fields_typical_card() {
        let raw = "BASIC\nPikachu\n60 HP\n\nThunder Jolt 30\n58/102\n";
        let fields = parse_fields(raw);
        assert_eq!(fields.name(), Some("Pikachu"));
        assert_eq!(fields.card_number(), Some("58/102"));
        assert_eq!(fields.set(), None);
        assert_eq!(fields.rarity(), None);
    }

    #[test]
    fn test_parse_fields_empty_text() {
        assert!(parse_fields("").is_empty());
        assert!(parse_fields("  \n \n").is_empty());
    }
}

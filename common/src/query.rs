//! カタログ検索式の組み立て
//!
//! Pokémon TCG API の `q` パラメータ構文:
//! - 名前: `name:"Pikachu"`（完全一致フレーズ）
//! - セット: `(set.id:"base1" OR set.name:"base1")`
//! - 番号: `number:58`
//!
//! 各句はスペース区切り（暗黙のAND）で結合する。

use crate::error::{Error, Result};
use crate::types::CardQuery;

/// 引用符内に入れる値から `"` を除去（空になった値は句にしない）
fn quote_safe(value: &str) -> Option<String> {
    let cleaned = value.replace('"', "").trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// カード番号をカタログの番号表記に変換
///
/// カタログはセット内番号のみをゼロ埋めなしで持つため、"58/102" は "58"、
/// "044/185" は "44" として検索する。"TG05" のような英字入りの番号はそのまま。
pub fn catalog_number(card_number: &str) -> String {
    let number = card_number
        .split('/')
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(card_number);

    if number.chars().all(|c| c.is_ascii_digit()) {
        let trimmed = number.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        number.to_string()
    }
}

pub fn name_clause(name: &str) -> Option<String> {
    quote_safe(name).map(|name| format!("name:\"{}\"", name))
}

pub fn set_clause(set: &str) -> Option<String> {
    quote_safe(set).map(|set| format!("(set.id:\"{set}\" OR set.name:\"{set}\")"))
}

pub fn number_clause(card_number: &str) -> Option<String> {
    let number = catalog_number(card_number).replace(['"', ' ', '\t'], "");
    (!number.is_empty()).then(|| format!("number:{}", number))
}

/// 検索式を生成
///
/// 有効な検索条件が1つもない場合は `Error::Validation`。
pub fn build_search_expression(query: &CardQuery) -> Result<String> {
    let clauses: Vec<String> = [
        query.name().and_then(name_clause),
        query.set().and_then(set_clause),
        query.card_number().and_then(number_clause),
    ]
    .into_iter()
    .flatten()
    .collect();

    if clauses.is_empty() {
        return Err(Error::Validation(
            "at least one of name, set or card number is required".into(),
        ));
    }

    Ok(clauses.join(" "))
}

//! カード名の修飾語（VMAX, ex, Radiant 等）の除去
//!
//! Visionモデルにもプロンプトで同じ規則を指示しているが、
//! モデル出力に残った修飾語をここで決定的に取り除く。

/// 基本名に含めない修飾語（前後どちらにあっても除去）
pub const DEFAULT_NAME_MODIFIERS: &[&str] = &[
    "VMAX", "VSTAR", "V-UNION", "V", "GX", "EX", "BREAK", "LV.X", "Radiant", "Tera",
];

/// 名前の一部か修飾語か判断できない接頭語（除去せず要確認とする）
pub const DEFAULT_AMBIGUOUS_PREFIXES: &[&str] = &[
    "Mega", "Dark", "Light", "Shining", "Alolan", "Galarian", "Hisuian", "Paldean",
];

/// 修飾語除去の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedName {
    pub name: String,
    /// 取り除いた修飾語
    pub removed: Vec<String>,
    /// 曖昧な接頭語で始まる（人手で確認すべき）
    pub ambiguous: bool,
}

/// 修飾語リスト（設定で拡張可能）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameModifiers {
    modifiers: Vec<String>,
    ambiguous_prefixes: Vec<String>,
}

impl Default for NameModifiers {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_MODIFIERS, DEFAULT_AMBIGUOUS_PREFIXES)
    }
}

impl NameModifiers {
    pub fn new<M, A>(modifiers: M, ambiguous_prefixes: A) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            modifiers: modifiers.into_iter().map(|m| m.as_ref().to_string()).collect(),
            ambiguous_prefixes: ambiguous_prefixes
                .into_iter()
                .map(|p| p.as_ref().to_string())
                .collect(),
        }
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    pub fn ambiguous_prefixes(&self) -> &[String] {
        &self.ambiguous_prefixes
    }

    fn is_modifier(&self, word: &str) -> bool {
        self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(word))
    }

    fn is_ambiguous(&self, word: &str) -> bool {
        self.ambiguous_prefixes.iter().any(|p| p.eq_ignore_ascii_case(word))
    }

    /// 名前の前後から修飾語を取り除く
    ///
    /// 最低1語は必ず残す。
    pub fn strip(&self, name: &str) -> StrippedName {
        let mut words: Vec<&str> = name.split_whitespace().collect();
        let mut removed = Vec::new();

        while words.len() > 1 && words.last().is_some_and(|w| self.is_modifier(w)) {
            if let Some(word) = words.pop() {
                removed.push(word.to_string());
            }
        }
        while words.len() > 1 && self.is_modifier(words[0]) {
            removed.push(words.remove(0).to_string());
        }

        let ambiguous = words.first().is_some_and(|w| self.is_ambiguous(w));

        StrippedName {
            name: words.join(" "),
            removed,
            ambiguous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_suffix() {
        let modifiers = NameModifiers::default();
        assert_eq!(modifiers.strip("Pikachu VMAX").name, "Pikachu");
        assert_eq!(modifiers.strip("Arceus VSTAR").name, "Arceus");
        assert_eq!(modifiers.strip("Mewtwo GX").name, "Mewtwo");
        assert_eq!(modifiers.strip("Zacian V").name, "Zacian");
    }

    #[test]
    fn test_strip_leading_radiant() {
        let stripped = NameModifiers::default().strip("Radiant Greninja");
        assert_eq!(stripped.name, "Greninja");
        assert_eq!(stripped.removed, vec!["Radiant".to_string()]);
        assert!(!stripped.ambiguous);
    }

    #[test]
    fn test_strip_multiple_and_case_insensitive() {
        let stripped = NameModifiers::default().strip("Charizard ex Tera");
        assert_eq!(stripped.name, "Charizard");
        assert_eq!(stripped.removed.len(), 2);
    }

    #[test]
    fn test_strip_keeps_last_word() {
        assert_eq!(NameModifiers::default().strip("Radiant").name, "Radiant");
        assert_eq!(NameModifiers::default().strip("V").name, "V");
    }

    #[test]
    fn test_strip_normalizes_whitespace() {
        assert_eq!(NameModifiers::default().strip("  Mr.  Mime  ").name, "Mr. Mime");
    }

    #[test]
    fn test_ambiguous_prefix_flagged_not_stripped() {
        let stripped = NameModifiers::default().strip("Mega Charizard X");
        assert_eq!(stripped.name, "Mega Charizard X");
        assert!(stripped.ambiguous);
    }

    #[test]
    fn test_custom_modifiers() {
        let modifiers = NameModifiers::new(["Prime"], Vec::<String>::new());
        assert_eq!(modifiers.strip("Typhlosion Prime").name, "Typhlosion");
        assert_eq!(modifiers.strip("Pikachu VMAX").name, "Pikachu VMAX");
        assert!(!modifiers.strip("Mega Venusaur").ambiguous);
    }
}

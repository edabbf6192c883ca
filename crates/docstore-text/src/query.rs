//! Keyword query language.
//!
//! - `a b` both terms required (`AND` between them is accepted and ignored)
//! - `"a b"` phrase: terms at consecutive positions
//! - `-a` / `NOT a` excluded
//! - `a OR b` alternative clauses
//!
//! Every item goes through the index tokenizer, so `E-Mail` becomes the
//! phrase `e mail` and stop words vanish when stop-word removal is on.

use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseTerm {
    pub text: String,
    /// Position relative to the first term of the phrase.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Term(String),
    Phrase(Vec<PhraseTerm>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub required: Vec<Item>,
    pub excluded: Vec<Item>,
}

/// Disjunction of conjunctive clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    /// True when no clause can match anything.
    pub fn is_empty(&self) -> bool { self.clauses.iter().all(|c| c.required.is_empty()) }
}

#[derive(Debug, PartialEq, Eq)]
enum Lexeme {
    Word { text: String, negated: bool },
    Quoted { text: String, negated: bool },
}

pub fn parse(input: &str, tokenizer: &Tokenizer) -> Query {
    let mut clauses = Vec::new();
    let mut current = Clause::default();
    let mut negate_next = false;

    for lexeme in lex(input) {
        let (text, negated) = match lexeme {
            Lexeme::Word { text, negated } => {
                if !negated {
                    match text.as_str() {
                        "OR" => {
                            clauses.push(std::mem::take(&mut current));
                            negate_next = false;
                            continue;
                        }
                        "AND" => continue,
                        "NOT" => {
                            negate_next = true;
                            continue;
                        }
                        _ => {}
                    }
                }
                (text, negated)
            }
            Lexeme::Quoted { text, negated } => (text, negated),
        };

        let negated = negated || std::mem::take(&mut negate_next);
        let Some(item) = to_item(&text, tokenizer) else { continue };
        if negated { current.excluded.push(item) } else { current.required.push(item) }
    }
    clauses.push(current);
    clauses.retain(|c| !c.required.is_empty() || !c.excluded.is_empty());
    Query { clauses }
}

fn to_item(text: &str, tokenizer: &Tokenizer) -> Option<Item> {
    let tokens = tokenizer.tokenize(text);
    match tokens.len() {
        0 => None,
        1 => tokens.into_iter().next().map(|t| Item::Term(t.text)),
        _ => {
            let base = tokens[0].position;
            Some(Item::Phrase(tokens.into_iter().map(|t| PhraseTerm { offset: t.position - base, text: t.text }).collect()))
        }
    }
}

fn lex(input: &str) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut negated = false;
        if c == '-' {
            chars.next();
            match chars.peek() {
                Some(&next) if !next.is_whitespace() => negated = true,
                _ => continue,
            }
        }
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut text = String::new();
            for ch in chars.by_ref() {
                if ch == '"' { break; }
                text.push(ch);
            }
            lexemes.push(Lexeme::Quoted { text, negated });
        } else {
            let mut text = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' { break; }
                text.push(ch);
                chars.next();
            }
            lexemes.push(Lexeme::Word { text, negated });
        }
    }
    lexemes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(t: &str) -> Item { Item::Term(t.to_string()) }

    fn parse_default(q: &str) -> Query { parse(q, &Tokenizer::default()) }

    #[test]
    fn bare_words_are_a_conjunction() {
        let q = parse_default("Deep  learning");
        assert_eq!(q.clauses.len(), 1);
        assert_eq!(q.clauses[0].required, vec![term("deep"), term("learning")]);
    }

    #[test]
    fn and_is_ignored_and_or_splits_clauses() {
        let q = parse_default("pasta AND recipes OR learning");
        assert_eq!(q.clauses.len(), 2);
        assert_eq!(q.clauses[0].required, vec![term("pasta"), term("recipes")]);
        assert_eq!(q.clauses[1].required, vec![term("learning")]);
    }

    #[test]
    fn negation_forms() {
        let q = parse_default("learning -deep NOT machine");
        assert_eq!(q.clauses[0].required, vec![term("learning")]);
        assert_eq!(q.clauses[0].excluded, vec![term("deep"), term("machine")]);
    }

    #[test]
    fn quoted_and_hyphenated_words_become_phrases() {
        let q = parse_default("\"Machine Learning\" e-mail");
        let expected_phrase = Item::Phrase(vec![
            PhraseTerm { text: "machine".into(), offset: 0 },
            PhraseTerm { text: "learning".into(), offset: 1 },
        ]);
        assert_eq!(q.clauses[0].required[0], expected_phrase);
        assert!(matches!(q.clauses[0].required[1], Item::Phrase(ref p) if p.len() == 2));
    }

    #[test]
    fn punctuation_only_query_is_empty() {
        assert!(parse_default("?? !!").is_empty());
        assert!(parse_default("").is_empty());
        assert!(parse_default("-learning").is_empty(), "pure negation matches nothing");
    }
}

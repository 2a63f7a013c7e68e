// This file is part of marsh, a POSIX-compatible shell.
// Copyright (C) 2024 the marsh authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Abstract syntax tree for globbing patterns

use crate::Config;
use crate::Error;
use crate::PatternChar;
use regex_syntax::ast::ClassAsciiKind;
use std::ops::RangeInclusive;

/// Bracket expression component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketAtom {
    /// Literal character
    Char(char),
    /// Character class (`[:digit:]`)
    CharClass(ClassAsciiKind),
}

/// Bracket expression component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketItem {
    /// Atom
    Atom(BracketAtom),
    /// Character range
    Range(RangeInclusive<char>),
}

/// Bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    /// Whether there is an initial `!` or `^`
    ///
    /// When the bracket expression starts with a complement marker, the set
    /// of matching characters is inverted.
    pub complement: bool,

    /// Content of the bracket expression
    pub items: Vec<BracketItem>,
}

/// Repetition of an alternation group
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupKind {
    /// `@(...)`: exactly one occurrence
    Exactly,
    /// `?(...)`: zero or one occurrence
    ZeroOrOne,
    /// `*(...)`: zero or more occurrences
    ZeroOrMore,
    /// `+(...)`: one or more occurrences
    OneOrMore,
}

/// Pattern component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Atom {
    /// Literal character
    Char(char),
    /// Pattern that matches a single character (`?`)
    AnyChar,
    /// Pattern that matches any string (`*`)
    AnyString,
    /// Bracket expression
    Bracket(Bracket),
    /// Alternation group (extended patterns only)
    Group {
        kind: GroupKind,
        branches: Vec<Vec<Atom>>,
    },
}

/// Parses a pattern into atoms, collecting warnings for constructs that are
/// taken literally.
pub(crate) fn parse(
    chars: &[PatternChar],
    config: Config,
) -> Result<(Vec<Atom>, Vec<String>), Error> {
    let mut parser = Parser {
        chars,
        pos: 0,
        config,
        warnings: Vec::new(),
    };
    let atoms = parser.parse_sequence(false)?;
    debug_assert_eq!(parser.pos, chars.len());
    Ok((atoms, parser.warnings))
}

/// Returns the plain string the atoms match, if they are all literal.
pub(crate) fn to_literal(atoms: &[Atom]) -> Option<String> {
    atoms
        .iter()
        .map(|atom| match atom {
            Atom::Char(c) => Some(*c),
            _ => None,
        })
        .collect()
}

/// Translates atoms to a regular expression.
pub(crate) fn to_regex(atoms: &[Atom], config: Config) -> String {
    let mut out = String::new();
    // `?` and `*` must match newlines; the subject is arbitrary data, not
    // lines of text.
    out.push_str("(?s)");
    if config.anchor_begin {
        out.push_str(r"\A");
    }
    sequence_to_regex(atoms, &mut out);
    if config.anchor_end {
        out.push_str(r"\z");
    }
    out
}

struct Parser<'a> {
    chars: &'a [PatternChar],
    pos: usize,
    config: Config,
    warnings: Vec<String>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<PatternChar> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<PatternChar> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip(&mut self, count: usize) {
        self.pos += count;
    }

    /// Parses atoms up to the end of input or, inside a group, up to a `|`
    /// or `)` delimiter (which is left unconsumed).
    fn parse_sequence(&mut self, in_group: bool) -> Result<Vec<Atom>, Error> {
        use PatternChar::Normal;
        let mut atoms = Vec::new();
        while let Some(pc) = self.peek() {
            if in_group && matches!(pc, Normal('|') | Normal(')')) {
                break;
            }
            atoms.push(self.parse_atom()?);
        }
        Ok(atoms)
    }

    fn parse_atom(&mut self) -> Result<Atom, Error> {
        use PatternChar::Normal;
        let pc = self.peek().unwrap();
        if self.config.extended && matches!(self.peek_at(1), Some(Normal('('))) {
            let kind = match pc {
                Normal('@') => Some(GroupKind::Exactly),
                Normal('?') => Some(GroupKind::ZeroOrOne),
                Normal('*') => Some(GroupKind::ZeroOrMore),
                Normal('+') => Some(GroupKind::OneOrMore),
                Normal('!') => return Err(Error::UnsupportedExtGlob),
                _ => None,
            };
            if let Some(kind) = kind {
                self.skip(2);
                return self.parse_group(kind);
            }
        }

        self.skip(1);
        match pc {
            Normal('?') => Ok(Atom::AnyChar),
            Normal('*') => Ok(Atom::AnyString),
            Normal('[') => {
                let saved = self.pos;
                match self.parse_bracket() {
                    Some(bracket) => Ok(Atom::Bracket(bracket)),
                    None => {
                        self.pos = saved;
                        self.warnings
                            .push("unmatched [ is taken literally".to_string());
                        Ok(Atom::Char('['))
                    }
                }
            }
            pc => Ok(Atom::Char(pc.char_value())),
        }
    }

    /// Parses the branches of an alternation group. The opening marker has
    /// been consumed.
    fn parse_group(&mut self, kind: GroupKind) -> Result<Atom, Error> {
        use PatternChar::Normal;
        let mut branches = Vec::new();
        loop {
            let branch = self.parse_sequence(true)?;
            branches.push(branch);
            match self.peek() {
                Some(Normal('|')) => self.skip(1),
                Some(Normal(')')) => {
                    self.skip(1);
                    return Ok(Atom::Group { kind, branches });
                }
                _ => return Err(Error::UnterminatedGroup),
            }
        }
    }

    /// Parses a bracket expression. The opening `[` has been consumed.
    /// Returns `None` if the expression is not terminated, in which case the
    /// caller restores the position and treats the `[` literally.
    fn parse_bracket(&mut self) -> Option<Bracket> {
        use PatternChar::Normal;
        let mut complement = false;
        if matches!(self.peek(), Some(Normal('!') | Normal('^'))) {
            complement = true;
            self.skip(1);
        }

        let mut items = Vec::new();
        let mut first = true;
        loop {
            match self.peek() {
                None => return None,
                Some(Normal(']')) if !first => {
                    self.skip(1);
                    return Some(Bracket { complement, items });
                }
                Some(Normal('[')) if matches!(self.peek_at(1), Some(Normal(':'))) => {
                    match self.parse_char_class() {
                        Some(class) => {
                            items.push(BracketItem::Atom(BracketAtom::CharClass(class)));
                        }
                        None => {
                            self.skip(1);
                            items.push(BracketItem::Atom(BracketAtom::Char('[')));
                        }
                    }
                }
                Some(pc) => {
                    self.skip(1);
                    let c = pc.char_value();
                    // A `-` between two characters forms a range unless it
                    // is trailing, in which case it is literal.
                    if matches!(self.peek(), Some(Normal('-')))
                        && self.peek_at(1).is_some()
                        && !matches!(self.peek_at(1), Some(Normal(']')))
                    {
                        self.skip(1);
                        let end = self.peek().unwrap().char_value();
                        self.skip(1);
                        items.push(BracketItem::Range(c..=end));
                    } else {
                        items.push(BracketItem::Atom(BracketAtom::Char(c)));
                    }
                }
            }
            first = false;
        }
    }

    /// Parses a `[:name:]` character class. The position is on the `[`.
    /// Returns `None` (restoring the position) when the class is malformed
    /// or unknown.
    fn parse_char_class(&mut self) -> Option<ClassAsciiKind> {
        use PatternChar::Normal;
        let saved = self.pos;
        self.skip(2); // "[:"
        let mut name = String::new();
        loop {
            match self.peek() {
                Some(Normal(':')) if matches!(self.peek_at(1), Some(Normal(']'))) => {
                    self.skip(2);
                    return match ClassAsciiKind::from_name(&name) {
                        Some(class) => Some(class),
                        None => {
                            self.warnings
                                .push(format!("unknown character class [:{name}:]"));
                            self.pos = saved;
                            None
                        }
                    };
                }
                Some(pc) if pc.char_value().is_ascii_alphanumeric() => {
                    name.push(pc.char_value());
                    self.skip(1);
                }
                _ => {
                    self.pos = saved;
                    return None;
                }
            }
        }
    }
}

fn sequence_to_regex(atoms: &[Atom], out: &mut String) {
    for atom in atoms {
        atom_to_regex(atom, out);
    }
}

fn atom_to_regex(atom: &Atom, out: &mut String) {
    match atom {
        Atom::Char(c) => {
            if regex_syntax::is_meta_character(*c) {
                out.push('\\');
            }
            out.push(*c);
        }
        Atom::AnyChar => out.push('.'),
        Atom::AnyString => out.push_str(".*"),
        Atom::Bracket(bracket) => bracket_to_regex(bracket, out),
        Atom::Group { kind, branches } => {
            out.push_str("(?:");
            for (i, branch) in branches.iter().enumerate() {
                if i != 0 {
                    out.push('|');
                }
                sequence_to_regex(branch, out);
            }
            out.push(')');
            match kind {
                GroupKind::Exactly => {}
                GroupKind::ZeroOrOne => out.push('?'),
                GroupKind::ZeroOrMore => out.push('*'),
                GroupKind::OneOrMore => out.push('+'),
            }
        }
    }
}

fn bracket_to_regex(bracket: &Bracket, out: &mut String) {
    out.push('[');
    if bracket.complement {
        out.push('^');
    }
    for item in &bracket.items {
        match item {
            BracketItem::Atom(BracketAtom::Char(c)) => class_char_to_regex(*c, out),
            BracketItem::Atom(BracketAtom::CharClass(class)) => {
                out.push_str("[:");
                out.push_str(class_name(class));
                out.push_str(":]");
            }
            BracketItem::Range(range) => {
                class_char_to_regex(*range.start(), out);
                out.push('-');
                class_char_to_regex(*range.end(), out);
            }
        }
    }
    out.push(']');
}

fn class_char_to_regex(c: char, out: &mut String) {
    if matches!(c, '[' | ']' | '\\' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

fn class_name(class: &ClassAsciiKind) -> &'static str {
    use ClassAsciiKind::*;
    match class {
        Alnum => "alnum",
        Alpha => "alpha",
        Ascii => "ascii",
        Blank => "blank",
        Cntrl => "cntrl",
        Digit => "digit",
        Graph => "graph",
        Lower => "lower",
        Print => "print",
        Punct => "punct",
        Space => "space",
        Upper => "upper",
        Word => "word",
        Xdigit => "xdigit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::without_escape;

    fn atoms(pattern: &str) -> Vec<Atom> {
        let chars: Vec<PatternChar> = without_escape(pattern).collect();
        parse(&chars, Config::default()).unwrap().0
    }

    #[test]
    fn literal_atoms() {
        assert_eq!(atoms("ab"), [Atom::Char('a'), Atom::Char('b')]);
    }

    #[test]
    fn wildcard_atoms() {
        assert_eq!(
            atoms("a?*"),
            [Atom::Char('a'), Atom::AnyChar, Atom::AnyString]
        );
    }

    #[test]
    fn bracket_atoms() {
        assert_eq!(
            atoms("[!a-z_]"),
            [Atom::Bracket(Bracket {
                complement: true,
                items: vec![
                    BracketItem::Range('a'..='z'),
                    BracketItem::Atom(BracketAtom::Char('_')),
                ],
            })]
        );
    }

    #[test]
    fn literal_chars_are_never_special() {
        let chars = [
            PatternChar::Literal('*'),
            PatternChar::Literal('['),
            PatternChar::Literal('?'),
        ];
        let (atoms, warnings) = parse(&chars, Config::default()).unwrap();
        assert_eq!(atoms, [Atom::Char('*'), Atom::Char('['), Atom::Char('?')]);
        assert_eq!(warnings, Vec::<String>::new());
    }

    #[test]
    fn literal_rbracket_does_not_close_bracket() {
        let chars = [
            PatternChar::Normal('['),
            PatternChar::Normal('a'),
            PatternChar::Literal(']'),
            PatternChar::Normal(']'),
        ];
        let (atoms, _) = parse(&chars, Config::default()).unwrap();
        assert_eq!(
            atoms,
            [Atom::Bracket(Bracket {
                complement: false,
                items: vec![
                    BracketItem::Atom(BracketAtom::Char('a')),
                    BracketItem::Atom(BracketAtom::Char(']')),
                ],
            })]
        );
    }

    #[test]
    fn to_literal_of_plain_pattern() {
        assert_eq!(to_literal(&atoms("foo.txt")), Some("foo.txt".to_string()));
        assert_eq!(to_literal(&atoms("foo*")), None);
    }

    #[test]
    fn regex_escapes_metacharacters() {
        let regex = to_regex(&atoms("a.b"), Config::default());
        assert_eq!(regex, r"(?s)a\.b");
    }

    #[test]
    fn regex_of_char_class() {
        let regex = to_regex(&atoms("[[:digit:]]"), Config::default());
        assert_eq!(regex, "(?s)[[:digit:]]");
    }
}

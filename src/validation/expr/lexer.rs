use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Question,
    Semicolon,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
}

impl Token {
    pub(super) fn describe(&self) -> String {
        match self {
            Token::Number(number) => number.to_string(),
            Token::Str(text) => format!("\"{}\"", text),
            Token::Ident(name) => name.clone(),
            Token::LParen => "(".to_owned(),
            Token::RParen => ")".to_owned(),
            Token::LBracket => "[".to_owned(),
            Token::RBracket => "]".to_owned(),
            Token::LBrace => "{".to_owned(),
            Token::RBrace => "}".to_owned(),
            Token::Comma => ",".to_owned(),
            Token::Dot => ".".to_owned(),
            Token::Colon => ":".to_owned(),
            Token::Question => "?".to_owned(),
            Token::Semicolon => ";".to_owned(),
            Token::Not => "!".to_owned(),
            Token::Plus => "+".to_owned(),
            Token::Minus => "-".to_owned(),
            Token::Star => "*".to_owned(),
            Token::Slash => "/".to_owned(),
            Token::Percent => "%".to_owned(),
            Token::Lt => "<".to_owned(),
            Token::Le => "<=".to_owned(),
            Token::Gt => ">".to_owned(),
            Token::Ge => ">=".to_owned(),
            Token::EqEq => "==".to_owned(),
            Token::NotEq => "!=".to_owned(),
            Token::StrictEq => "===".to_owned(),
            Token::StrictNotEq => "!==".to_owned(),
            Token::And => "&&".to_owned(),
            Token::Or => "||".to_owned(),
        }
    }
}

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while let Some(&ch) = chars.get(pos) {
        if ch.is_whitespace() {
            pos = pos.saturating_add(1);
            continue;
        }
        if ch.is_ascii_digit() {
            let (token, next) = lex_number(&chars, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }
        if ch == '"' || ch == '\'' {
            let (text, next) = lex_string(&chars, pos, ch)?;
            tokens.push(Token::Str(text));
            pos = next;
            continue;
        }
        if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let start = pos;
            while let Some(&next) = chars.get(pos) {
                if next.is_alphanumeric() || next == '_' || next == '$' {
                    pos = pos.saturating_add(1);
                } else {
                    break;
                }
            }
            let name: String = chars.get(start..pos).unwrap_or_default().iter().collect();
            tokens.push(Token::Ident(name));
            continue;
        }

        let peek = |offset: usize| chars.get(pos.saturating_add(offset)).copied();
        let (token, width) = match (ch, peek(1), peek(2)) {
            ('=', Some('='), Some('=')) => (Token::StrictEq, 3),
            ('!', Some('='), Some('=')) => (Token::StrictNotEq, 3),
            ('=', Some('='), _) => (Token::EqEq, 2),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('{', _, _) => (Token::LBrace, 1),
            ('}', _, _) => (Token::RBrace, 1),
            (',', _, _) => (Token::Comma, 1),
            ('.', _, _) => (Token::Dot, 1),
            (':', _, _) => (Token::Colon, 1),
            ('?', _, _) => (Token::Question, 1),
            (';', _, _) => (Token::Semicolon, 1),
            ('!', _, _) => (Token::Not, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            _ => return Err(ExprError::UnexpectedChar { ch, pos }),
        };
        tokens.push(token);
        pos = pos.saturating_add(width);
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ExprError> {
    let mut pos = start;
    let mut seen_dot = false;
    let mut seen_exp = false;
    while let Some(&ch) = chars.get(pos) {
        let accept = if ch.is_ascii_digit() {
            true
        } else if ch == '.' && !seen_dot && !seen_exp {
            // `1.foo` is a member access, not a fraction
            let follows_digit = chars
                .get(pos.saturating_add(1))
                .is_some_and(char::is_ascii_digit);
            seen_dot = follows_digit;
            follows_digit
        } else if (ch == 'e' || ch == 'E') && !seen_exp {
            seen_exp = true;
            true
        } else {
            (ch == '+' || ch == '-')
                && seen_exp
                && matches!(chars.get(pos.saturating_sub(1)), Some('e' | 'E'))
        };
        if !accept {
            break;
        }
        pos = pos.saturating_add(1);
    }
    let text: String = chars.get(start..pos).unwrap_or_default().iter().collect();
    let number = text
        .parse::<f64>()
        .map_err(|_err: std::num::ParseFloatError| ExprError::InvalidNumber {
            value: text.clone(),
        })?;
    Ok((Token::Number(number), pos))
}

fn lex_string(chars: &[char], start: usize, quote: char) -> Result<(String, usize), ExprError> {
    let mut pos = start.saturating_add(1);
    let mut text = String::new();
    loop {
        let Some(&ch) = chars.get(pos) else {
            return Err(ExprError::UnterminatedString { pos: start });
        };
        pos = pos.saturating_add(1);
        if ch == quote {
            return Ok((text, pos));
        }
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        let Some(&escaped) = chars.get(pos) else {
            return Err(ExprError::UnterminatedString { pos: start });
        };
        pos = pos.saturating_add(1);
        match escaped {
            'n' => text.push('\n'),
            't' => text.push('\t'),
            'r' => text.push('\r'),
            'u' => {
                let hex: String = chars
                    .get(pos..pos.saturating_add(4))
                    .unwrap_or_default()
                    .iter()
                    .collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(ExprError::UnterminatedString { pos: start })?;
                text.push(decoded);
                pos = pos.saturating_add(4);
            }
            other => text.push(other),
        }
    }
}

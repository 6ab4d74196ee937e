use std::collections::HashMap;

use miette::Result;

use crate::command::{Arg, CommandId, CommandList, Opcode};
use crate::error;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::span::{Idx, Span};

/// Commands read from source, with the source location of each one.
#[derive(Debug)]
pub struct ParsedProgram {
    pub commands: CommandList,
    /// Indexed like `commands`.
    spans: Vec<Span>,
}

impl ParsedProgram {
    /// Source location of the command at `index`.
    pub fn span(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }
}

/// Reads the textual program format. One label (`name:`) or one command per line; `--` and `;`
/// start comments.
pub struct ProgramParser<'a> {
    src: &'a str,
    /// Without whitespace and comments
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> ProgramParser<'a> {
    pub fn new(src: &'a str) -> Self {
        let tokens = tokenize(src)
            .filter(|token| !matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment))
            .collect();
        ProgramParser {
            src,
            tokens,
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<ParsedProgram> {
        let mut commands = CommandList::new();
        let mut spans = Vec::new();
        let mut labels: HashMap<&'a str, CommandId> = HashMap::new();
        // Jumps and the span of the label name they refer to, resolved once all labels are known
        let mut jumps: Vec<(CommandId, Span)> = Vec::new();

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => continue,
                TokenKind::Ident => (),
                kind => {
                    return Err(error::parse_unexpected(
                        token.span,
                        self.src,
                        "a command or label",
                        kind,
                    ))
                }
            }

            let text = self.text(token.span);
            if self.peek().kind == TokenKind::Colon {
                let colon = self.advance();
                if labels.contains_key(text) {
                    return Err(error::parse_duplicate_label(token.span, self.src));
                }
                let id = commands.push(Opcode::Label, None);
                spans.push(token.span.join(colon.span));
                labels.insert(text, id);
                // A command may follow on the same line
                continue;
            }

            let opcode: Opcode = text
                .parse()
                .map_err(|_| error::parse_unknown_mnemonic(token.span, self.src))?;
            let id = commands.push(opcode, None);
            let mut span = token.span;

            if opcode.takes_slot() {
                let operand = self.operand(token.span, TokenKind::Int, "a slot number")?;
                let slot = self
                    .text(operand.span)
                    .parse::<usize>()
                    .map_err(|_| error::parse_bad_slot(operand.span, self.src))?;
                commands.set_arg(id, Some(Arg::Slot(slot)));
                span = span.join(operand.span);
            } else if opcode.takes_target() {
                let operand = self.operand(token.span, TokenKind::Ident, "a label")?;
                jumps.push((id, operand.span));
                span = span.join(operand.span);
            }
            spans.push(span);

            let end = self.advance();
            if !matches!(end.kind, TokenKind::Newline | TokenKind::Eof) {
                return Err(error::parse_unexpected(
                    end.span,
                    self.src,
                    "end of line",
                    end.kind,
                ));
            }
        }

        for (id, span) in jumps {
            let target = labels
                .get(self.text(span))
                .ok_or_else(|| error::parse_undefined_label(span, self.src))?;
            commands.set_arg(id, Some(Arg::Target(*target)));
        }

        Ok(ParsedProgram { commands, spans })
    }

    /// Operand of the command at `command`, which must be of `kind`.
    fn operand(&mut self, command: Span, kind: TokenKind, expected: &str) -> Result<Token> {
        let operand = self.advance();
        match operand.kind {
            found if found == kind => Ok(operand),
            TokenKind::Newline | TokenKind::Eof => {
                Err(error::parse_missing_operand(command, self.src, expected))
            }
            found => Err(error::parse_unexpected(
                operand.span,
                self.src,
                expected,
                found,
            )),
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(Token {
            kind: TokenKind::Eof,
            span: Span::new(Idx(self.src.len() as u32), 0),
        })
    }

    fn text(&self, span: Span) -> &'a str {
        &self.src[span.as_range()]
    }
}

/// Parse a whole program.
pub fn parse(src: &str) -> Result<ParsedProgram> {
    ProgramParser::new(src).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Instruction, Program};

    fn build(src: &str) -> Program {
        Program::build(&parse(src).unwrap().commands).unwrap()
    }

    #[test]
    fn parses_every_command() {
        let program = build(
            "
            -- every command once
            top:
                INBOX
                copyto 0
                CopyFrom 1
                ADD 2
                SUB 3
                JUMPZ top
                OUTBOX
                jump top
            ",
        );
        assert_eq!(
            program.iter().copied().collect::<Vec<_>>(),
            vec![
                Instruction::Label,
                Instruction::Input,
                Instruction::CopyTo(0),
                Instruction::CopyFrom(1),
                Instruction::Add(2),
                Instruction::Sub(3),
                Instruction::JumpIfZero(0),
                Instruction::Output,
                Instruction::Jump(0),
            ]
        );
    }

    #[test]
    fn forward_jumps() {
        let program = build(
            "
                JUMP end ; skip everything
                INBOX
                OUTBOX
            end:
            ",
        );
        assert_eq!(program.get(0), Some(Instruction::Jump(3)));
        assert_eq!(program.len(), 4);
    }

    #[test]
    fn command_after_label_on_same_line() {
        let program = build("a: INBOX\nJUMP a");
        assert_eq!(program.get(0), Some(Instruction::Label));
        assert_eq!(program.get(1), Some(Instruction::Input));
        assert_eq!(program.get(2), Some(Instruction::Jump(0)));
    }

    #[test]
    fn spans_point_at_commands() {
        let src = "INBOX\n  COPYTO 4\nend:";
        let parsed = parse(src).unwrap();
        assert_eq!(&src[parsed.span(0).unwrap().as_range()], "INBOX");
        assert_eq!(&src[parsed.span(1).unwrap().as_range()], "COPYTO 4");
        assert_eq!(&src[parsed.span(2).unwrap().as_range()], "end:");
        assert_eq!(parsed.span(3), None);
    }

    #[test]
    fn empty_program() {
        let parsed = parse("-- nothing here\n\n").unwrap();
        assert!(parsed.commands.is_empty());
    }

    #[test]
    fn errors() {
        assert!(parse("BUMPUP 0").is_err());
        assert!(parse("COPYTO").is_err());
        assert!(parse("COPYTO -1").is_err());
        assert!(parse("COPYTO a").is_err());
        assert!(parse("INBOX 3").is_err());
        assert!(parse("JUMP nowhere").is_err());
        assert!(parse("a:\na:").is_err());
        assert!(parse("12").is_err());
        assert!(parse(":").is_err());
    }
}

//! Declaration parsing
//!
//! One method per grammar production: units (library, behaviour, sequence),
//! attributes, const lists, starters, states, bodies and commands.

use super::ast::*;
use super::state::ParserState;
use super::super::lexer::tokens::TokenKind;
use super::ParseError;
use crate::middle::catalogue;
use crate::util::span::Span;

/// Attribute argument before it is shaped by the attribute name
enum Arg {
    Assign(Assign),
    Expr(Expr),
}

impl<'a> ParserState<'a> {
    /// Parse a whole compilation unit
    pub fn parse_root(&mut self) -> Result<Root, ParseError> {
        let start = self.span();
        let attributes = self.parse_attributes()?;

        let root = match self.kind() {
            TokenKind::KwLibrary => Root::Library(self.parse_library(attributes, start)?),
            TokenKind::KwBehaviour => Root::Behaviour(self.parse_behaviour(attributes, start)?),
            TokenKind::KwSequence => Root::Sequence(self.parse_sequence(attributes, start)?),
            _ => return Err(self.expected("`library`, `behaviour` or `sequence`")),
        };

        if !self.at_end() {
            return Err(self.expected("end of input"));
        }
        Ok(root)
    }

    /// Parse `attribute*`
    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        while self.at(&TokenKind::LBracket) {
            attributes.push(self.parse_attribute()?);
        }
        Ok(attributes)
    }

    /// Parse `'[' IDENT ('(' arg (',' arg)* ')')? ']'`
    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.expect(&TokenKind::LBracket)?;
        let position = self.position();
        let (name, _) = self.expect_ident("attribute name")?;

        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !self.at(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_arg()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        self.expect(&TokenKind::RBracket)?;

        let bad_args = |problem: &str| ParseError::BadAttributeArgs {
            name: name.clone(),
            problem: problem.to_string(),
            position,
        };

        let kind = match name.as_str() {
            "GlobalIndex" | "Priority" | "InstanceType" | "UseObjectSlot" | "Unknown" => {
                let expr = match (args.pop(), args.is_empty()) {
                    (Some(Arg::Expr(expr)), true) => expr,
                    _ => return Err(bad_args("takes exactly one expression")),
                };
                match name.as_str() {
                    "GlobalIndex" => AttributeKind::GlobalIndex(expr),
                    "Priority" => AttributeKind::Priority(expr),
                    "InstanceType" => AttributeKind::InstanceType(expr),
                    "UseObjectSlot" => AttributeKind::UseObjectSlot(expr),
                    _ => AttributeKind::Unknown(expr),
                }
            }
            "StartFrom" => match (args.pop(), args.is_empty()) {
                (Some(Arg::Expr(Expr::Const(state, _))), true) => AttributeKind::StartFrom(state),
                _ => return Err(bad_args("takes exactly one state name")),
            },
            "ControlPacket" => {
                let mut body = ControlPacketBody::default();
                for arg in args {
                    match arg {
                        Arg::Assign(setting) => body.settings.push(setting),
                        Arg::Expr(word) => body.data.push(word),
                    }
                }
                AttributeKind::ControlPacket(body)
            }
            "NonBlocking" | "SkipFirstBody" => {
                if !args.is_empty() {
                    return Err(bad_args("takes no arguments"));
                }
                if name == "NonBlocking" {
                    AttributeKind::NonBlocking
                } else {
                    AttributeKind::SkipFirstBody
                }
            }
            _ => return Err(ParseError::UnknownAttribute { name: name.clone(), position }),
        };

        Ok(Attribute {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_arg(&mut self) -> Result<Arg, ParseError> {
        let is_assign = matches!(self.kind(), TokenKind::Identifier(_)) && self.peek_kind() == &TokenKind::Eq;
        if is_assign {
            Ok(Arg::Assign(self.parse_assign()?))
        } else {
            Ok(Arg::Expr(self.parse_expr()?))
        }
    }

    /// Parse `constDecl*`
    fn parse_const_list(&mut self) -> Result<ConstList, ParseError> {
        let mut decls = Vec::new();
        while self.at(&TokenKind::KwConst) {
            let start = self.span();
            self.bump();
            let (name, _) = self.expect_ident("const name")?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon)?;
            decls.push(ConstDecl {
                name,
                value,
                span: self.span_from(start),
            });
        }
        Ok(ConstList { decls })
    }

    /// Parse `'library' IDENT '{' constDecl* behaviour* '}'`
    fn parse_library(
        &mut self,
        attributes: Vec<Attribute>,
        start: Span,
    ) -> Result<Library, ParseError> {
        self.expect(&TokenKind::KwLibrary)?;
        let (name, _) = self.expect_ident("library name")?;
        self.expect(&TokenKind::LBrace)?;
        let consts = self.parse_const_list()?;

        let mut behaviours = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let item_start = self.span();
            let item_attributes = self.parse_attributes()?;
            if !self.at(&TokenKind::KwBehaviour) {
                return Err(self.expected("`behaviour` or `}`"));
            }
            behaviours.push(self.parse_behaviour(item_attributes, item_start)?);
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Library {
            attributes,
            name,
            consts,
            behaviours,
            span: self.span_from(start),
        })
    }

    /// Parse `'behaviour' IDENT '{' constDecl* starter? state+ '}'`
    fn parse_behaviour(
        &mut self,
        attributes: Vec<Attribute>,
        start: Span,
    ) -> Result<Behaviour, ParseError> {
        self.expect(&TokenKind::KwBehaviour)?;
        let (name, _) = self.expect_ident("behaviour name")?;
        self.expect(&TokenKind::LBrace)?;
        let consts = self.parse_const_list()?;

        let starter = if self.at(&TokenKind::KwStarter) {
            Some(self.parse_starter()?)
        } else {
            None
        };

        let mut states = Vec::new();
        loop {
            let state_start = self.span();
            let state_attributes = self.parse_attributes()?;
            if !self.at(&TokenKind::KwState) {
                if states.is_empty() || !state_attributes.is_empty() {
                    return Err(self.expected("`state`"));
                }
                break;
            }
            states.push(self.parse_state(state_attributes, state_start)?);
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Behaviour {
            attributes,
            name,
            consts,
            starter,
            states,
            span: self.span_from(start),
        })
    }

    /// Parse `'starter' '{' assigner* '}'`
    fn parse_starter(&mut self) -> Result<Starter, ParseError> {
        let start = self.expect(&TokenKind::KwStarter)?;
        self.expect(&TokenKind::LBrace)?;

        let mut assigners = Vec::new();
        while self.at(&TokenKind::KwAssign) {
            let assign_start = self.span();
            self.bump();
            let object = self.parse_reference()?;
            let mut fields = Vec::new();
            if self.eat(&TokenKind::LParen) {
                loop {
                    fields.push(self.parse_assign()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen)?;
            }
            self.expect(&TokenKind::Semicolon)?;
            assigners.push(Assigner {
                object,
                fields,
                span: self.span_from(assign_start),
            });
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Starter {
            assigners,
            span: self.span_from(start),
        })
    }

    /// Parse `'state' IDENT '(' reference? ')' '{' body* '}'`
    fn parse_state(
        &mut self,
        attributes: Vec<Attribute>,
        start: Span,
    ) -> Result<State, ParseError> {
        self.expect(&TokenKind::KwState)?;
        let (name, _) = self.expect_ident("state name")?;
        self.expect(&TokenKind::LParen)?;
        let target = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_reference()?)
        };
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;

        let mut bodies = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            bodies.push(self.parse_body()?);
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(State {
            attributes,
            name,
            target,
            bodies,
            span: self.span_from(start),
        })
    }

    /// Parse `('if' condition | 'do') '{' command* ('goto' IDENT ';')? '}'`
    fn parse_body(&mut self) -> Result<StateBody, ParseError> {
        let start = self.span();
        let condition = match self.kind() {
            TokenKind::KwIf => {
                self.bump();
                Some(self.parse_condition()?)
            }
            TokenKind::KwDo => {
                self.bump();
                None
            }
            _ => return Err(self.expected("`if`, `do` or `}`")),
        };

        self.expect(&TokenKind::LBrace)?;
        let mut commands = Vec::new();
        while matches!(self.kind(), TokenKind::Identifier(_)) {
            commands.push(self.parse_command()?);
        }
        let jump = if self.eat(&TokenKind::KwGoto) {
            let (state, _) = self.expect_ident("state name")?;
            self.expect(&TokenKind::Semicolon)?;
            Some(state)
        } else {
            None
        };
        self.expect(&TokenKind::RBrace)?;

        Ok(StateBody {
            condition,
            commands,
            jump,
            span: self.span_from(start),
        })
    }

    /// Parse `'not'? IDENT '(' expr? ')'`
    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let start = self.span();
        let negate = self.eat(&TokenKind::KwNot);
        let position = self.position();
        let (name, _) = self.expect_ident("condition name")?;
        let id = catalogue::condition_id(&name).ok_or(ParseError::UnknownCondition { name, position })?;

        self.expect(&TokenKind::LParen)?;
        let parameter = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::RParen)?;

        Ok(Condition {
            id,
            negate,
            parameter,
            span: self.span_from(start),
        })
    }

    /// Parse `IDENT '(' (expr (',' expr)*)? ')' ';'`
    fn parse_command(&mut self) -> Result<Command, ParseError> {
        let start = self.span();
        let position = self.position();
        let (name, _) = self.expect_ident("command name")?;
        let id = catalogue::command_id(&name).ok_or(ParseError::UnknownCommand { name, position })?;
        let args = self.parse_expr_list()?;
        self.expect(&TokenKind::Semicolon)?;

        Ok(Command {
            id,
            args,
            span: self.span_from(start),
        })
    }

    /// Parse `'sequence' IDENT '{' constDecl* pack* command* '}'`
    fn parse_sequence(
        &mut self,
        attributes: Vec<Attribute>,
        start: Span,
    ) -> Result<Sequence, ParseError> {
        self.expect(&TokenKind::KwSequence)?;
        let (name, _) = self.expect_ident("sequence name")?;
        self.expect(&TokenKind::LBrace)?;
        let consts = self.parse_const_list()?;

        let mut packs = Vec::new();
        while self.at(&TokenKind::KwPack) {
            let pack_start = self.span();
            self.bump();
            self.expect(&TokenKind::LParen)?;
            let script = self.parse_reference()?;
            self.expect(&TokenKind::RParen)?;
            self.expect(&TokenKind::LBrace)?;
            let mut commands = Vec::new();
            while !self.at(&TokenKind::RBrace) {
                commands.push(self.parse_command()?);
            }
            self.expect(&TokenKind::RBrace)?;
            packs.push(CommandPack {
                script,
                commands,
                span: self.span_from(pack_start),
            });
        }

        let mut commands = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            commands.push(self.parse_command()?);
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Sequence {
            attributes,
            name,
            consts,
            packs,
            commands,
            span: self.span_from(start),
        })
    }
}

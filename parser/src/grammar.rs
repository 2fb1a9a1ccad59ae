//! Recursive-descent grammar for C declarations.
//!
//! Only the declaration subset of C is parsed. Function bodies, struct and
//! union member lists, initializers and attribute arguments are skipped as
//! balanced token runs. Every completed declaration is handed to the
//! semantic actions on [`Session`], which decide what gets documented.
//!
//! No preprocessor is run, so identifiers that are neither keywords nor
//! known typedef names are taken as type names when their position makes
//! that the only sensible reading (`size_t n`, `FILE *fp`).

use c2man_core::{
    DeclFlags, DeclSpec, Declarator, DeclaratorKind, EnumListId, Enumerator, Identifier,
    Parameter, Session,
};
use tracing::{debug, trace};

use crate::lexer::{Token, TokenKind};

/// A syntax error that has already been recorded on the session.
#[derive(Debug)]
struct SyntaxError;

type Parsed<T> = std::result::Result<T, SyntaxError>;

const TYPE_KEYWORDS: &[&str] = &[
    "void", "int", "long", "signed", "unsigned", "double", "_Bool", "_Complex", "__signed__",
    "__int128",
];

const QUALIFIERS: &[&str] = &[
    "const",
    "volatile",
    "restrict",
    "__restrict",
    "__restrict__",
    "__const",
    "__volatile__",
    "_Atomic",
];

const ATTRIBUTES: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "__asm__",
    "__asm",
    "asm",
];

const INLINE: &[&str] = &["inline", "__inline", "__inline__"];

fn is_keyword(word: &str) -> bool {
    TYPE_KEYWORDS.contains(&word)
        || QUALIFIERS.contains(&word)
        || ATTRIBUTES.contains(&word)
        || INLINE.contains(&word)
        || matches!(
            word,
            "typedef"
                | "extern"
                | "static"
                | "auto"
                | "register"
                | "char"
                | "short"
                | "float"
                | "struct"
                | "union"
                | "enum"
                | "__extension__"
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Declaration,
    Parameter,
}

/// Result of parsing declaration specifiers.
struct Specifiers {
    spec: DeclSpec,
    is_typedef: bool,
}

pub(crate) struct Grammar<'a> {
    tokens: Vec<Token>,
    pos: usize,
    session: &'a mut Session,
    /// Open `extern "C" {` blocks.
    extern_blocks: usize,
    /// Comment that preceded an `extern "C"` prefix.
    carried_comment: Option<String>,
}

impl<'a> Grammar<'a> {
    pub(crate) fn new(session: &'a mut Session, tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            session,
            extern_blocks: 0,
            carried_comment: None,
        }
    }

    // --- token access ---

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    /// Token consumed most recently.
    fn prev(&self) -> Option<&Token> {
        self.pos.checked_sub(1).map(|i| &self.tokens[i])
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        self.sync(&token);
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, text: &str) -> Option<Token> {
        self.peek().is(text).then(|| self.bump())
    }

    fn expect(&mut self, text: &str) -> Parsed<Token> {
        match self.eat(text) {
            Some(token) => Ok(token),
            None => Err(self.syntax_error(&format!("expected '{text}'"))),
        }
    }

    /// Moves the session's notion of the current position to `token`.
    fn sync(&mut self, token: &Token) {
        let source = &mut self.session.source;
        source.line = token.line;
        source.in_base_file = token.in_base_file;
        if source.current_file.as_deref() != token.file.as_deref() {
            source.current_file = token.file.as_deref().map(str::to_string);
        }
    }

    fn syntax_error(&mut self, expected: &str) -> SyntaxError {
        let token = self.peek().clone();
        self.sync(&token);
        let found = match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", token.text),
        };
        self.session
            .error(format!("syntax error: {expected}, found {found}"));
        SyntaxError
    }

    // --- translation unit ---

    pub(crate) fn translation_unit(&mut self) {
        while !self.at_eof() {
            if self.eat(";").is_some() {
                continue;
            }
            if self.peek().is("}") {
                if self.extern_blocks > 0 {
                    self.extern_blocks -= 1;
                } else {
                    self.syntax_error("unbalanced '}'");
                }
                self.bump();
                continue;
            }
            if self.peek().is("extern") && self.peek_nth(1).kind == TokenKind::StringLiteral {
                let linkage = self.bump();
                self.bump();
                if self.eat("{").is_some() {
                    self.extern_blocks += 1;
                } else {
                    self.carried_comment = linkage.comment_before;
                }
                continue;
            }
            if matches!(
                self.peek().text.as_str(),
                "_Static_assert" | "static_assert" | "asm" | "__asm__"
            ) {
                self.skip_statement();
                continue;
            }
            if self.external_declaration().is_err() {
                self.recover();
            }
        }
    }

    /// Skips to the end of the current declaration after a syntax error.
    fn recover(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            let text = self.peek().text.clone();
            match text.as_str() {
                ";" if depth == 0 => {
                    self.bump();
                    return;
                }
                "{" => depth += 1,
                "}" if depth == 0 => return,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    fn skip_statement(&mut self) {
        while !self.at_eof() {
            if self.peek().is("(") {
                if self.skip_balanced("(", ")").is_err() {
                    return;
                }
                continue;
            }
            if self.bump().is(";") {
                return;
            }
        }
    }

    fn external_declaration(&mut self) -> Parsed<()> {
        let comment = self
            .peek()
            .comment_before
            .clone()
            .or_else(|| self.carried_comment.take());
        self.carried_comment = None;

        let specifiers = self.decl_specifiers(Context::Declaration)?;
        if specifiers.is_some() && self.eat(";").is_some() {
            // struct, union or enum definition without declarators
            return Ok(());
        }

        let return_comment = specifiers
            .as_ref()
            .and_then(|_| self.peek().comment_before.clone());
        let (spec, is_typedef) = match specifiers {
            Some(s) => (s.spec, s.is_typedef),
            None => (DeclSpec::new("int", DeclFlags::empty()), false),
        };

        let mut declarators: Vec<Declarator> = Vec::new();
        let eol_comment = loop {
            let start = self.pos;
            let mut declarator = self.required_declarator()?;
            self.skip_attributes()?;

            if declarators.is_empty()
                && !is_typedef
                && declarator.is_function()
                && (self.peek().is("{") || self.peek().is_identifier())
            {
                declarator.return_comment = return_comment;
                return self.function_definition(comment, spec, declarator);
            }

            if declarators.is_empty() {
                declarator.return_comment = return_comment.clone();
            } else if self.tokens[start].comment_before.is_some() {
                declarator.comment = self.tokens[start].comment_before.clone();
            }

            if self.eat("=").is_some() {
                self.skip_expression(&[",", ";"])?;
            }
            let trailing = self.prev().and_then(|t| t.comment_after.clone());
            declarators.push(declarator);

            if let Some(comma) = self.eat(",") {
                for comment in trailing.into_iter().chain(comma.comment_after) {
                    self.session.comment_last_decl(&mut declarators, comment);
                }
                continue;
            }
            let semi = self.expect(";")?;
            match (trailing, semi.comment_after) {
                (Some(trailing), Some(after)) => {
                    self.session.comment_last_decl(&mut declarators, trailing);
                    break Some(after);
                }
                (trailing, after) => break after.or(trailing),
            }
        };

        if is_typedef {
            self.session.new_typedef_symbols(&spec, &declarators);
        }
        trace!(count = declarators.len(), "declaration");
        self.session
            .remember_declarations(comment, spec, declarators, eol_comment);
        Ok(())
    }

    /// Handles the K&R parameter declarations and body of a definition.
    fn function_definition(
        &mut self,
        comment: Option<String>,
        spec: DeclSpec,
        mut declarator: Declarator,
    ) -> Parsed<()> {
        while !self.peek().is("{") {
            if self.at_eof() {
                return Err(self.syntax_error("expected function body"));
            }
            self.parameter_declaration(&mut declarator)?;
        }

        let open = self.bump();
        let body_comment = open.comment_after.or_else(|| self.peek().comment_before.clone());
        self.skip_until_close("}")?;
        declarator.kind = DeclaratorKind::FunctionDef;

        let options = &self.session.options;
        let comment = if options.body_start_only {
            body_comment
        } else if options.look_at_body_start && comment.is_none() {
            body_comment
        } else {
            comment
        };

        debug!(name = ?declarator.name, "function definition");
        self.session
            .remember_declarations(comment, spec, vec![declarator], None);
        Ok(())
    }

    /// One K&R parameter declaration such as `char *s, c;`.
    fn parameter_declaration(&mut self, function: &mut Declarator) -> Parsed<()> {
        let comment = self.peek().comment_before.clone();
        let Some(specifiers) = self.decl_specifiers(Context::Declaration)? else {
            return Err(self.syntax_error("expected parameter declaration"));
        };

        let mut declarators = Vec::new();
        let eol_comment = loop {
            let declarator = self.required_declarator()?;
            let trailing = self.prev().and_then(|t| t.comment_after.clone());
            declarators.push(declarator);
            if let Some(comma) = self.eat(",") {
                for comment in trailing.into_iter().chain(comma.comment_after) {
                    self.session.comment_last_decl(&mut declarators, comment);
                }
                continue;
            }
            let semi = self.expect(";")?;
            match (trailing, semi.comment_after) {
                (Some(trailing), Some(after)) => {
                    self.session.comment_last_decl(&mut declarators, trailing);
                    break Some(after);
                }
                (trailing, after) => break after.or(trailing),
            }
        };

        self.session.apply_parameter_types(
            function.head_parameters_mut(),
            specifiers.spec,
            declarators,
            comment,
            eol_comment,
        );
        Ok(())
    }

    // --- specifiers ---

    /// Declaration specifiers; `None` when the declaration starts with its
    /// declarator.
    fn decl_specifiers(&mut self, context: Context) -> Parsed<Option<Specifiers>> {
        let mut spec: Option<DeclSpec> = None;
        let mut is_typedef = false;
        let mut seen_type = false;

        while self.peek().is_identifier() {
            let word = self.peek().text.clone();
            let part = match word.as_str() {
                "typedef" => {
                    is_typedef = true;
                    self.keyword(DeclFlags::JUNK)
                }
                "auto" | "register" => self.keyword(DeclFlags::JUNK),
                "extern" => self.keyword(DeclFlags::EXTERN),
                "static" => self.keyword(DeclFlags::STATIC),
                w if INLINE.contains(&w) => self.keyword(DeclFlags::INLINE),
                w if QUALIFIERS.contains(&w) => self.keyword(DeclFlags::empty()),
                "char" | "short" | "float" => {
                    seen_type = true;
                    let flag = match word.as_str() {
                        "char" => DeclFlags::CHAR,
                        "short" => DeclFlags::SHORT,
                        _ => DeclFlags::FLOAT,
                    };
                    self.keyword(flag)
                }
                w if TYPE_KEYWORDS.contains(&w) => {
                    seen_type = true;
                    self.keyword(DeclFlags::empty())
                }
                "__extension__" => {
                    self.bump();
                    continue;
                }
                w if ATTRIBUTES.contains(&w) => {
                    self.skip_attributes()?;
                    continue;
                }
                "struct" | "union" => {
                    seen_type = true;
                    self.struct_specifier()?
                }
                "enum" => {
                    seen_type = true;
                    self.enum_specifier()?
                }
                w if !seen_type && self.session.is_typedef_name(w) => {
                    seen_type = true;
                    self.bump();
                    let spec = DeclSpec::new(w, DeclFlags::empty());
                    match self.session.typedef_enum_list(w) {
                        Some(list) => spec.with_enum_list(list),
                        None => spec,
                    }
                }
                w if !seen_type && self.names_type(context) => {
                    trace!(name = w, "assuming unknown identifier names a type");
                    seen_type = true;
                    self.keyword(DeclFlags::empty())
                }
                // a macro between the type and the declarator, as in `int EXPORT f(void)`
                w if seen_type && !is_keyword(w) && self.peek_nth(1).is_identifier() => {
                    self.keyword(DeclFlags::empty())
                }
                _ => break,
            };
            spec = Some(match spec {
                Some(spec) => spec.join(part),
                None => part,
            });
        }

        Ok(spec.map(|spec| Specifiers { spec, is_typedef }))
    }

    /// Consumes the current word as a specifier fragment.
    fn keyword(&mut self, flags: DeclFlags) -> DeclSpec {
        let token = self.bump();
        DeclSpec::new(token.text, flags)
    }

    /// Whether the unknown identifier at the cursor is a type name.
    fn names_type(&self, context: Context) -> bool {
        let next = self.peek_nth(1);
        match context {
            Context::Parameter => true,
            Context::Declaration => {
                next.is_identifier()
                    || next.is("*")
                    || (next.is("(") && self.peek_nth(2).is("*"))
            }
        }
    }

    fn struct_specifier(&mut self) -> Parsed<DeclSpec> {
        let mut text = self.bump().text;
        self.skip_attributes()?;
        if self.peek().is_identifier() {
            text.push(' ');
            text.push_str(&self.bump().text);
        }
        if self.peek().is("{") {
            self.skip_balanced("{", "}")?;
        }
        self.skip_attributes()?;
        Ok(DeclSpec::new(text, DeclFlags::empty()))
    }

    fn enum_specifier(&mut self) -> Parsed<DeclSpec> {
        let mut text = self.bump().text;
        self.skip_attributes()?;
        let tag = if self.peek().is_identifier() {
            let tag = self.bump().text;
            text.push(' ');
            text.push_str(&tag);
            Some(tag)
        } else {
            None
        };

        let list = if self.peek().is("{") {
            self.enumerator_list(tag.as_deref())?
        } else {
            tag.as_deref().and_then(|tag| self.session.find_enum_tag(tag))
        };

        let spec = DeclSpec::new(text, DeclFlags::empty());
        Ok(match list {
            Some(list) => spec.with_enum_list(list),
            None => spec,
        })
    }

    fn enumerator_list(&mut self, tag: Option<&str>) -> Parsed<Option<EnumListId>> {
        let open = self.expect("{")?;
        let mut leading = open.comment_after;
        let mut list: Option<EnumListId> = None;

        while !self.peek().is("}") {
            if !self.peek().is_identifier() {
                return Err(self.syntax_error("expected enumerator"));
            }
            let name = self.bump();
            let before = name.comment_before.or_else(|| leading.take());
            if self.eat("=").is_some() {
                self.skip_expression(&[",", "}"])?;
            }
            let after = self.trailing_comments(",");

            let mut after = after.into_iter();
            let enumerator = Enumerator::new(name.text, before, after.next());
            let id = match list {
                Some(id) => {
                    self.session.enums.append(id, enumerator);
                    id
                }
                None => {
                    let id = self.session.new_enum_list(tag, enumerator);
                    list = Some(id);
                    id
                }
            };
            for comment in after {
                self.session.comment_last_enumerator(id, comment);
            }

            if self.prev().is_some_and(|t| t.is(",")) {
                continue;
            }
            if !self.peek().is("}") {
                return Err(self.syntax_error("expected ',' or '}'"));
            }
        }
        self.bump();
        Ok(list)
    }

    /// Comments trailing a list item: after its last token, before the
    /// separator and after the separator. Consumes the separator when it is
    /// `separator`.
    fn trailing_comments(&mut self, separator: &str) -> Vec<String> {
        let mut comments = Vec::new();
        comments.extend(self.prev().and_then(|t| t.comment_after.clone()));
        comments.extend(self.peek().comment_before.clone());
        if let Some(sep) = self.eat(separator) {
            comments.extend(sep.comment_after);
        }
        comments
    }

    // --- declarators ---

    fn required_declarator(&mut self) -> Parsed<Declarator> {
        match self.declarator(false)? {
            Some(declarator) => Ok(declarator),
            None => Err(self.syntax_error("expected declarator")),
        }
    }

    fn declarator(&mut self, abstract_ok: bool) -> Parsed<Option<Declarator>> {
        let pointer = self.pointer()?;
        let direct = self.direct_declarator(abstract_ok)?;
        Ok(match (pointer, direct) {
            (None, direct) => direct,
            (Some(pointer), Some(direct)) => Some(direct.pointer_to(&pointer)),
            (Some(pointer), None) => Some(Declarator::new(
                Some(pointer.trim_end().to_string()),
                None,
            )),
        })
    }

    /// Pointer operators with their qualifiers, e.g. `*const `.
    fn pointer(&mut self) -> Parsed<Option<String>> {
        let mut text = String::new();
        while self.eat("*").is_some() {
            text.push('*');
            loop {
                let word = self.peek().text.clone();
                if QUALIFIERS.contains(&word.as_str()) {
                    self.bump();
                    text.push_str(&word);
                    text.push(' ');
                } else if ATTRIBUTES.contains(&word.as_str()) {
                    self.skip_attributes()?;
                } else {
                    break;
                }
            }
        }
        Ok((!text.is_empty()).then_some(text))
    }

    fn direct_declarator(&mut self, abstract_ok: bool) -> Parsed<Option<Declarator>> {
        let mut declarator = if self.peek().is_identifier() && !is_keyword(&self.peek().text) {
            Some(Declarator::identifier(self.bump().text))
        } else if self.peek().is("(") && (!abstract_ok || self.opens_nested_declarator()) {
            self.bump();
            let inner = self.declarator(abstract_ok)?;
            self.expect(")")?;
            Some(
                inner
                    .unwrap_or_else(|| Declarator::new(Some(String::new()), None))
                    .parenthesized(),
            )
        } else if abstract_ok {
            None
        } else {
            return Err(self.syntax_error("expected declarator"));
        };

        loop {
            if self.peek().is("[") {
                let suffix = self.bracket_text()?;
                let base = declarator.unwrap_or_else(|| Declarator::new(Some(String::new()), None));
                declarator = Some(base.array_of(&suffix));
            } else if self.peek().is("(") {
                let parameters = self.parameter_list()?;
                let base = declarator.unwrap_or_else(|| Declarator::new(Some(String::new()), None));
                declarator = Some(Declarator::function(base, parameters));
            } else if ATTRIBUTES.contains(&self.peek().text.as_str()) {
                self.skip_attributes()?;
            } else {
                break;
            }
        }
        Ok(declarator)
    }

    /// Whether the `(` at the cursor opens a nested abstract declarator
    /// rather than a parameter list.
    fn opens_nested_declarator(&self) -> bool {
        let next = self.peek_nth(1);
        next.is("*")
            || next.is("(")
            || next.is("[")
            || (next.is_identifier()
                && !is_keyword(&next.text)
                && !self.session.is_typedef_name(&next.text))
    }

    /// Text of an array suffix such as `[MAX + 1]`.
    fn bracket_text(&mut self) -> Parsed<String> {
        let start = self.pos;
        self.skip_balanced("[", "]")?;
        let mut text = String::new();
        let mut prev_word = false;
        for token in &self.tokens[start..self.pos] {
            let word = matches!(token.kind, TokenKind::Identifier | TokenKind::Number);
            if word && prev_word {
                text.push(' ');
            }
            text.push_str(&token.text);
            prev_word = word;
        }
        Ok(text)
    }

    // --- parameters ---

    fn parameter_list(&mut self) -> Parsed<Vec<Parameter>> {
        let open = self.expect("(")?;
        let mut leading = open.comment_after;
        let mut params: Vec<Parameter> = Vec::new();

        if self.eat(")").is_some() {
            return Ok(params);
        }
        if self.is_identifier_list() {
            return self.identifier_list(leading);
        }

        loop {
            let before = self
                .peek()
                .comment_before
                .clone()
                .or_else(|| leading.take());
            let (spec, declarator) = if self.eat("...").is_some() {
                (Some(DeclSpec::empty(DeclFlags::JUNK)), Some(Declarator::ellipsis()))
            } else {
                let specifiers = self.decl_specifiers(Context::Parameter)?;
                let declarator = self.declarator(true)?;
                if specifiers.is_none() && declarator.is_none() {
                    return Err(self.syntax_error("expected parameter"));
                }
                (specifiers.map(|s| s.spec), declarator)
            };

            let mut after = self.trailing_comments(",").into_iter();
            let param = self
                .session
                .new_parameter(spec, declarator, before, after.next());
            params.push(param);
            for comment in after {
                self.session.comment_last_parameter(&mut params, comment);
            }

            if self.prev().is_some_and(|t| t.is(",")) {
                continue;
            }
            self.expect(")")?;
            return Ok(params);
        }
    }

    /// Whether the cursor is at a K&R identifier list followed by the
    /// parameter declarations or body of a definition.
    fn is_identifier_list(&self) -> bool {
        let mut i = 0;
        loop {
            let token = self.peek_nth(i);
            if !token.is_identifier()
                || is_keyword(&token.text)
                || self.session.is_typedef_name(&token.text)
            {
                return false;
            }
            let sep = self.peek_nth(i + 1);
            if sep.is(",") {
                i += 2;
                continue;
            }
            if sep.is(")") {
                let after = self.peek_nth(i + 2);
                return after.is("{") || after.is_identifier();
            }
            return false;
        }
    }

    fn identifier_list(&mut self, mut leading: Option<String>) -> Parsed<Vec<Parameter>> {
        let mut params: Vec<Parameter> = Vec::new();
        loop {
            let name = self.bump();
            let comment_before = name.comment_before.or_else(|| leading.take());
            let mut after = self.trailing_comments(",").into_iter();
            let ident = Identifier {
                name: name.text,
                comment_before,
                comment_after: after.next(),
            };
            params.push(self.session.identifier_parameter(ident));
            for comment in after {
                self.session.comment_last_parameter(&mut params, comment);
            }

            if self.prev().is_some_and(|t| t.is(",")) {
                continue;
            }
            self.expect(")")?;
            return Ok(params);
        }
    }

    // --- skipping ---

    fn skip_attributes(&mut self) -> Parsed<()> {
        while ATTRIBUTES.contains(&self.peek().text.as_str()) {
            self.bump();
            if self.peek().is("(") {
                self.skip_balanced("(", ")")?;
            }
        }
        Ok(())
    }

    /// Skips from an opening token through its matching closing token.
    fn skip_balanced(&mut self, open: &str, close: &str) -> Parsed<()> {
        self.expect(open)?;
        self.skip_until_close(close)
    }

    /// Skips through the closing token matching an already consumed opener.
    fn skip_until_close(&mut self, close: &str) -> Parsed<()> {
        let mut depth = 0usize;
        loop {
            if self.at_eof() {
                return Err(self.syntax_error(&format!("expected '{close}'")));
            }
            let token = self.bump();
            match token.text.as_str() {
                "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
                ")" | "]" | "}" if token.kind == TokenKind::Punct => {
                    if depth == 0 {
                        return if token.text == close {
                            Ok(())
                        } else {
                            Err(self.syntax_error(&format!("expected '{close}'")))
                        };
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    /// Skips an expression up to one of `stops` at nesting depth zero.
    fn skip_expression(&mut self, stops: &[&str]) -> Parsed<()> {
        let mut depth = 0usize;
        loop {
            if self.at_eof() {
                return Err(self.syntax_error("unexpected end of file"));
            }
            let text = self.peek().text.clone();
            if depth == 0 && stops.contains(&text.as_str()) {
                return Ok(());
            }
            match text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" if depth == 0 => {
                    return Err(self.syntax_error("unbalanced expression"));
                }
                ")" | "]" | "}" => depth -= 1,
                _ => {}
            }
            self.bump();
        }
    }
}

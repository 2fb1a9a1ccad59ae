use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Storage-class and type-specifier markers carried by a declaration
    /// specifier.
    ///
    /// Only the bits that influence documentation decisions are tracked; the
    /// specifier text itself is kept verbatim in [`DeclSpec::text`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DeclFlags: u8 {
        /// Contains `extern`.
        const EXTERN = 1;
        /// Contains `static`.
        const STATIC = 2;
        /// Contains `char`.
        const CHAR = 4;
        /// Contains `short`.
        const SHORT = 8;
        /// Contains `float`.
        const FLOAT = 16;
        /// Not worth documenting (`typedef`, `auto`, `register`, K&R placeholders).
        const JUNK = 32;
        /// Contains `inline`.
        const INLINE = 64;
    }
}

/// Index of an enumerator list owned by an [`EnumStore`](crate::EnumStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumListId(pub(crate) usize);

impl EnumListId {
    /// Position of the list inside its store.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The type/storage-class portion of a declaration, e.g. `static const char`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclSpec {
    pub flags: DeclFlags,
    /// Source text. `None` for the specifier of an ellipsis parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Enumerator list this type resolves to, making it self-documenting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_list: Option<EnumListId>,
}

impl DeclSpec {
    /// Creates a specifier from source text.
    pub fn new(text: impl Into<String>, flags: DeclFlags) -> Self {
        Self {
            flags,
            text: Some(text.into()),
            enum_list: None,
        }
    }

    /// Creates a specifier without text.
    pub fn empty(flags: DeclFlags) -> Self {
        Self {
            flags,
            text: None,
            enum_list: None,
        }
    }

    pub fn with_enum_list(mut self, list: EnumListId) -> Self {
        self.enum_list = Some(list);
        self
    }

    /// Combines two adjacent specifier fragments.
    ///
    /// Texts are joined with a single space, flags are OR-ed. When both sides
    /// name an enumerator list the first one is kept.
    ///
    /// ```
    /// use c2man_core::{DeclFlags, DeclSpec};
    ///
    /// let spec = DeclSpec::new("static", DeclFlags::STATIC)
    ///     .join(DeclSpec::new("char", DeclFlags::CHAR));
    /// assert_eq!(spec.text.as_deref(), Some("static char"));
    /// assert_eq!(spec.flags, DeclFlags::STATIC | DeclFlags::CHAR);
    /// ```
    pub fn join(self, other: DeclSpec) -> DeclSpec {
        let text = match (self.text, other.text) {
            (Some(a), Some(b)) => Some(format!("{a} {b}")),
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        DeclSpec {
            flags: self.flags | other.flags,
            text,
            enum_list: self.enum_list.or(other.enum_list),
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(DeclFlags::STATIC)
    }

    pub fn is_extern(&self) -> bool {
        self.flags.contains(DeclFlags::EXTERN)
    }

    pub fn is_junk(&self) -> bool {
        self.flags.contains(DeclFlags::JUNK)
    }
}

/// Shape of a declarator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaratorKind {
    /// Plain identifier, pointer or array.
    #[default]
    Simple,
    /// Parenthesized declarator that is not a function, e.g. a function
    /// pointer variable `(*handler)(int)`.
    Compound,
    /// Function prototype.
    Function,
    /// Function definition (a body follows).
    FunctionDef,
}

/// Name-and-shape portion of a declaration.
///
/// Function declarators wrap the declarator they apply to in `inner`; their
/// `text` is a template in which `%s` stands for the inner declarator and
/// `()` for the parameter list. `int (*signal(int, void (*)(int)))(int)`
/// therefore nests two function declarators, and [`Declarator::head`]
/// resolves to the one holding `signal`'s own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Declarator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source text; `None` for abstract declarators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub kind: DeclaratorKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<Declarator>>,
}

/// Text of the ellipsis parameter.
pub const ELLIPSIS: &str = "...";

impl Declarator {
    /// Builds a simple declarator.
    pub fn new(text: Option<String>, name: Option<String>) -> Self {
        Self {
            name,
            text,
            ..Self::default()
        }
    }

    /// Declarator naming an identifier directly.
    pub fn identifier(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(Some(name.clone()), Some(name))
    }

    /// Declarator with neither text nor name, as in `int f(double)`.
    pub fn abstract_declarator() -> Self {
        Self::default()
    }

    /// Declarator standing for `...` in a parameter list.
    pub fn ellipsis() -> Self {
        Self::new(Some(ELLIPSIS.to_string()), None)
    }

    /// Applies a parameter list to `inner`, producing a function declarator.
    ///
    /// Applying a list to a parenthesized non-function declarator yields a
    /// [`DeclaratorKind::Compound`] (a pointer to function), everything else
    /// a [`DeclaratorKind::Function`].
    pub fn function(inner: Declarator, parameters: Vec<Parameter>) -> Self {
        let kind = match inner.kind {
            DeclaratorKind::Function | DeclaratorKind::FunctionDef => DeclaratorKind::Function,
            DeclaratorKind::Compound => DeclaratorKind::Compound,
            DeclaratorKind::Simple if inner.text.as_deref().is_some_and(|t| t.starts_with('(')) => {
                DeclaratorKind::Compound
            }
            DeclaratorKind::Simple => DeclaratorKind::Function,
        };
        Self {
            name: inner.name.clone(),
            text: Some("%s()".to_string()),
            kind,
            parameters,
            comment: None,
            return_comment: None,
            inner: Some(Box::new(inner)),
        }
    }

    /// Prefixes the declarator text with a pointer operator such as `*const `.
    pub fn pointer_to(mut self, pointer: &str) -> Self {
        let text = self.text.take().unwrap_or_default();
        self.text = Some(format!("{pointer}{text}"));
        self
    }

    /// Wraps the declarator text in parentheses.
    pub fn parenthesized(mut self) -> Self {
        let text = self.text.take().unwrap_or_default();
        self.text = Some(format!("({text})"));
        self
    }

    /// Appends an array suffix such as `[]` or `[N]`.
    pub fn array_of(mut self, suffix: &str) -> Self {
        let text = self.text.take().unwrap_or_default();
        self.text = Some(format!("{text}{suffix}"));
        self
    }

    /// The declarator holding this declaration's own parameter list.
    pub fn head(&self) -> &Declarator {
        match self.inner.as_deref() {
            Some(inner) if inner.inner.is_some() => inner.head(),
            _ => self,
        }
    }

    /// Mutable access to the head declarator's parameters.
    pub fn head_parameters_mut(&mut self) -> &mut Vec<Parameter> {
        match self.inner.as_deref_mut() {
            Some(inner) if inner.inner.is_some() => inner.head_parameters_mut(),
            _ => &mut self.parameters,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self.kind,
            DeclaratorKind::Function | DeclaratorKind::FunctionDef
        )
    }

    /// Whether the declaration takes parameters; `f()` and `f(void)` do not.
    pub fn has_parameters(&self) -> bool {
        list_has_parameters(&self.head().parameters)
    }

    /// Whether this is the `...` pseudo-declarator.
    pub fn is_ellipsis(&self) -> bool {
        self.text.as_deref() == Some(ELLIPSIS)
    }
}

/// Parameter-list form of [`Declarator::has_parameters`].
pub fn list_has_parameters(parameters: &[Parameter]) -> bool {
    match parameters {
        [] => false,
        [only] => {
            only.declarator.text.is_some() || only.decl_spec.text.as_deref() != Some("void")
        }
        _ => true,
    }
}

/// One entry of a function parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub decl_spec: DeclSpec,
    pub declarator: Declarator,
    /// Hidden on a grouped page because an identical parameter is shown.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suppress: bool,
    /// Shown, and annotated with its function, because an identical
    /// parameter elsewhere on the page is documented differently.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

impl Parameter {
    pub fn new(decl_spec: DeclSpec, declarator: Declarator) -> Self {
        Self {
            decl_spec,
            declarator,
            suppress: false,
            duplicate: false,
        }
    }

    /// Parameter named in a K&R identifier list whose type is not yet known.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(DeclSpec::empty(DeclFlags::JUNK), Declarator::identifier(name))
    }

    /// The `...` parameter.
    pub fn ellipsis() -> Self {
        Self::new(DeclSpec::empty(DeclFlags::JUNK), Declarator::ellipsis())
    }

    pub fn comment(&self) -> Option<&str> {
        self.declarator.comment.as_deref()
    }

    /// Whether two parameters are declared identically: same flags, same
    /// specifier text and same declarator text (absent on both sides counts
    /// as equal).
    pub fn is_identical(&self, other: &Parameter) -> bool {
        self.decl_spec.flags == other.decl_spec.flags
            && self.decl_spec.text == other.decl_spec.text
            && self.declarator.text == other.declarator.text
    }
}

/// An identifier in a K&R parameter list together with its comments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identifier {
    pub name: String,
    pub comment_before: Option<String>,
    pub comment_after: Option<String>,
}

/// A single enumeration constant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Introduces this and the following enumerators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_comment: Option<String>,
}

impl Enumerator {
    /// Creates an enumerator from the comments found around it.
    ///
    /// The trailing comment describes the enumerator itself; when both are
    /// present, the leading one becomes the group comment.
    pub fn new(
        name: impl Into<String>,
        comment_before: Option<String>,
        comment_after: Option<String>,
    ) -> Self {
        let (comment, group_comment) = match (comment_before, comment_after) {
            (Some(before), Some(after)) => (Some(after), Some(before)),
            (before, None) => (before, None),
            (None, after) => (after, None),
        };
        Self {
            name: name.into(),
            comment,
            group_comment,
        }
    }
}

//! Parsed-script directive tree.
//!
//! The script grammar itself is parsed by an external collaborator; this is
//! the shape the compiler consumes: an ordered tree of named directives, each
//! with positional string parameters and ordered children. Lookups are typed
//! accessors with explicit presence (`Option`), never truthiness.

/// One directive in a parsed script.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub children: Vec<Directive>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn param_value(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn child(mut self, child: Directive) -> Self {
        self.children.push(child);
        self
    }

    /// Shorthand for a `name value` property child.
    pub fn prop_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.child(Directive::new(name).param_value(value))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// First child directive with the given name.
    pub fn first(&self, name: &str) -> Option<&Directive> {
        self.children.iter().find(|d| d.name == name)
    }

    /// All child directives with the given name, in document order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.children.iter().filter(move |d| d.name == name)
    }

    /// First parameter of the first child with the given name.
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(|d| d.param(0))
    }
}

/// A whole parsed script: the ordered top-level directives of the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Script {
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl Script {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self { directives }
    }

    pub fn first(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.directives.iter().filter(move |d| d.name == name)
    }
}

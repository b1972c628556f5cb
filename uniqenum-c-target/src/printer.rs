use crate::names::{MacroNameRegistry, TemplateNameRegistry};
use std::fmt::{self, Display, Formatter};
use uniqenum::format::Arg;
use uniqenum::ident::{Ident, IdentAllocator, ScopedIdents};
use uniqenum::options::{AssertMode, CodeOptions, MacroFamily};

/// Number of parts the clique form splits the enumerators into.
const CLIQUE_PARTS: u32 = 3;

/// A single `#define` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub params: Vec<Ident>,
    pub body: String,
}

impl MacroDef {
    /// Size of the definition in bytes, including the trailing newline.
    pub fn size(&self) -> u64 {
        let params: usize = self.params.iter().map(Ident::len).sum();
        let commas = self.params.len().saturating_sub(1);
        ("#define ".len() + self.name.len() + 2 + params + commas + self.body.len() + 1) as u64
    }
}

impl Display for MacroDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#define {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", param)?;
        }
        writeln!(f, "){}", self.body)
    }
}

/// Prints C11 definitions of `areuniq` and `uniqenum` macros.
pub struct C11MacroPrinter<'a> {
    options: &'a CodeOptions,
    names: TemplateNameRegistry<'a>,
    idents: IdentAllocator,

    /// Smallest `N` at which the clique form of `areuniq` was found shorter than the expanded
    /// one. Every larger `N` uses the clique form.
    clique_pivot: Option<u32>,
}

impl<'a> C11MacroPrinter<'a> {
    pub fn new(options: &'a CodeOptions) -> C11MacroPrinter<'a> {
        let idents = if options.avoid_keywords {
            IdentAllocator::new()
        } else {
            IdentAllocator::unreserved()
        };
        C11MacroPrinter {
            options,
            names: TemplateNameRegistry::new(options),
            idents,
            clique_pivot: None,
        }
    }

    pub fn macro_name(&mut self, family: MacroFamily, n: u32) -> String {
        self.names.macro_name(family, n).to_string()
    }

    /// Definition of the `n`-ary macro of `family`, or `None` below the family's minimum size
    /// and when its parameters run out of identifiers.
    pub fn macro_def(&mut self, family: MacroFamily, n: u32) -> Option<MacroDef> {
        if n < family.min_n() {
            return None;
        }
        match family {
            MacroFamily::Areuniq => self.areuniq(n),
            MacroFamily::Uniqenum => self.uniqenum(n),
        }
    }

    fn areuniq(&mut self, n: u32) -> Option<MacroDef> {
        let name = self.macro_name(MacroFamily::Areuniq, n);

        if n == 2 {
            let params = self.params(&ScopedIdents::empty(), 2)?;
            let body = self.pair(&params[0], &params[1]);
            return Some(MacroDef { name, params, body });
        }

        let parts = partition_cliques(n);
        let callees: Vec<String> = combinations(&parts)
            .map(|(p, q)| self.macro_name(MacroFamily::Areuniq, p.len + q.len))
            .collect();
        let scope = ScopedIdents::new(&self.idents, callees.iter().map(String::as_str));
        let params = self.params(&scope, n)?;

        let clique = self.areuniq_clique(&parts, &callees, &params);
        let body = match self.clique_pivot {
            Some(pivot) if pivot <= n => clique,
            _ => {
                let expanded = self.areuniq_expanded(&params);
                if clique.len() < expanded.len() {
                    tracing::debug!(n, "clique form of `areuniq` is shorter from here on");
                    self.clique_pivot = Some(n);
                    clique
                } else {
                    expanded
                }
            }
        };

        Some(MacroDef { name, params, body })
    }

    /// Checks every pair of parts with a smaller `areuniq`.
    fn areuniq_clique(&self, parts: &[Clique], callees: &[String], params: &[Ident]) -> String {
        let calls: Vec<String> = combinations(parts)
            .zip(callees)
            .map(|((p, q), callee)| {
                let args: Vec<&str> = p
                    .members()
                    .chain(q.members())
                    .map(|i| params[i].as_str())
                    .collect();
                format!("{}({})", callee, args.join(","))
            })
            .collect();
        calls.join(self.joiner())
    }

    /// Checks every pair of parameters directly.
    fn areuniq_expanded(&self, params: &[Ident]) -> String {
        let mut pairs = Vec::new();
        for (i, x) in params.iter().enumerate() {
            for y in &params[i + 1..] {
                pairs.push(self.pair(x, y));
            }
        }
        pairs.join(self.joiner())
    }

    fn pair(&self, x: &Ident, y: &Ident) -> String {
        let condition = format!("(({})!=({}))", x, y);
        match self.options.assert.mode {
            AssertMode::Once => condition,
            AssertMode::All => {
                let message = self.options.assert.message.render_c_string(&[
                    ("enumerator1", Arg::Param(x.as_str())),
                    ("enumerator2", Arg::Param(y.as_str())),
                ]);
                format!("_Static_assert({},{})", condition, message)
            }
        }
    }

    fn joiner(&self) -> &'static str {
        match self.options.assert.mode {
            AssertMode::Once => "*",
            AssertMode::All => ";",
        }
    }

    fn uniqenum(&mut self, n: u32) -> Option<MacroDef> {
        let name = self.macro_name(MacroFamily::Uniqenum, n);
        let mut scope = vec!["enum".to_string(), name.clone()];
        let areuniq = if n >= 2 {
            let areuniq = self.macro_name(MacroFamily::Areuniq, n);
            scope.push(areuniq.clone());
            Some(areuniq)
        } else {
            None
        };
        let scope = ScopedIdents::new(&self.idents, scope.iter().map(String::as_str));

        let n64 = u64::from(n);
        let keys: Vec<Ident> = (0..n64)
            .map(|i| scope.ident(&mut self.idents, i))
            .collect::<Option<_>>()?;
        let values: Vec<Ident> = (n64..2 * n64)
            .map(|i| scope.ident(&mut self.idents, i))
            .collect::<Option<_>>()?;
        let enum_name = scope.ident(&mut self.idents, 2 * n64 + 1)?;
        let enum_type = scope.ident(&mut self.idents, 2 * n64 + 2)?;

        let enumerators: Vec<String> = keys
            .iter()
            .zip(&values)
            .map(|(key, value)| format!("{} {}", key, value))
            .collect();
        let mut body = format!("enum {}{{{}}}{}", enum_name, enumerators.join(","), enum_type);

        if let Some(areuniq) = areuniq {
            let keys: Vec<&str> = keys.iter().map(Ident::as_str).collect();
            let check = format!("{}({})", areuniq, keys.join(","));
            match self.options.assert.mode {
                AssertMode::Once => {
                    let n = n.to_string();
                    let message = self.options.assert.message.render_c_string(&[
                        ("n", Arg::Text(&n)),
                        ("name", Arg::Param(enum_name.as_str())),
                        ("type", Arg::Param(enum_type.as_str())),
                    ]);
                    body.push_str(&format!(";_Static_assert({},{})", check, message));
                }
                AssertMode::All => {
                    body.push(';');
                    body.push_str(&check);
                }
            }
        }

        let mut params = Vec::with_capacity(2 * n as usize + 2);
        params.push(enum_name);
        for (key, value) in keys.into_iter().zip(values) {
            params.push(key);
            params.push(value);
        }
        params.push(enum_type);

        Some(MacroDef { name, params, body })
    }

    fn params(&mut self, scope: &ScopedIdents, n: u32) -> Option<Vec<Ident>> {
        (0..u64::from(n))
            .map(|i| scope.ident(&mut self.idents, i))
            .collect()
    }
}

/// A run of consecutive parameter positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Clique {
    offset: u32,
    len: u32,
}

impl Clique {
    fn members(self) -> impl Iterator<Item = usize> {
        (self.offset as usize)..(self.offset + self.len) as usize
    }
}

/// Splits `0..n` into `CLIQUE_PARTS` runs whose sizes differ by at most one, larger first.
fn partition_cliques(n: u32) -> Vec<Clique> {
    let base = n / CLIQUE_PARTS;
    let extra = n % CLIQUE_PARTS;
    (0..CLIQUE_PARTS)
        .map(|p| Clique {
            offset: p * base + p.min(extra),
            len: base + if p < extra { 1 } else { 0 },
        })
        .collect()
}

fn combinations(parts: &[Clique]) -> impl Iterator<Item = (Clique, Clique)> + '_ {
    parts
        .iter()
        .enumerate()
        .flat_map(move |(i, &p)| parts[i + 1..].iter().map(move |&q| (p, q)))
}

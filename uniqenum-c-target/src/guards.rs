use uniqenum::ident::naive;
use uniqenum::options::IncludeGuardStyle;

/// Writes the include guard around a header.
#[derive(Clone, Copy, Debug)]
pub struct IncludeGuard {
    style: IncludeGuardStyle,
}

impl IncludeGuard {
    pub fn new(style: IncludeGuardStyle) -> IncludeGuard {
        IncludeGuard { style }
    }

    /// Opening lines of a header identified by `slug`.
    pub fn start(&self, slug: &str) -> String {
        match self.style {
            IncludeGuardStyle::Classic => format!("#ifndef UNIQ_{0}_H\n#define UNIQ_{0}_H\n", slug),
            IncludeGuardStyle::PragmaOnce => "#pragma once\n".to_string(),
            IncludeGuardStyle::Omit => String::new(),
        }
    }

    pub fn end(&self) -> &'static str {
        match self.style {
            IncludeGuardStyle::Classic => "#endif\n",
            IncludeGuardStyle::PragmaOnce | IncludeGuardStyle::Omit => "",
        }
    }
}

/// Guard slug of the `file_number`-th generated header.
pub fn file_slug(file_number: u64) -> String {
    naive(u128::from(file_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_guard() {
        let guard = IncludeGuard::new(IncludeGuardStyle::Classic);
        assert_eq!(guard.start(&file_slug(0)), "#ifndef UNIQ_a_H\n#define UNIQ_a_H\n");
        assert_eq!(guard.start(&file_slug(52)), "#ifndef UNIQ_aa_H\n#define UNIQ_aa_H\n");
        assert_eq!(guard.end(), "#endif\n");
    }

    #[test]
    fn pragma_once_and_omitted_guards() {
        let pragma = IncludeGuard::new(IncludeGuardStyle::PragmaOnce);
        assert_eq!(pragma.start("a"), "#pragma once\n");
        assert_eq!(pragma.end(), "");

        let omit = IncludeGuard::new(IncludeGuardStyle::Omit);
        assert_eq!(omit.start("a"), "");
        assert_eq!(omit.end(), "");
    }
}

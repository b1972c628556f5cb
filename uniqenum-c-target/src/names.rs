use std::collections::HashMap;
use uniqenum::format::{Arg, Template};
use uniqenum::options::{CodeOptions, MacroFamily};

pub trait MacroNameRegistry {
    fn areuniq_name(&mut self, n: u32) -> &str;
    fn uniqenum_name(&mut self, n: u32) -> &str;

    fn macro_name(&mut self, family: MacroFamily, n: u32) -> &str {
        match family {
            MacroFamily::Areuniq => self.areuniq_name(n),
            MacroFamily::Uniqenum => self.uniqenum_name(n),
        }
    }
}

/// Renders macro names from the configured templates. Every name is rendered once.
pub struct TemplateNameRegistry<'a> {
    options: &'a CodeOptions,
    areuniq_names: HashMap<u32, String>,
    uniqenum_names: HashMap<u32, String>,
}

impl<'a> TemplateNameRegistry<'a> {
    pub fn new(options: &'a CodeOptions) -> TemplateNameRegistry<'a> {
        TemplateNameRegistry {
            options,
            areuniq_names: HashMap::new(),
            uniqenum_names: HashMap::new(),
        }
    }
}

impl<'a> MacroNameRegistry for TemplateNameRegistry<'a> {
    fn areuniq_name(&mut self, n: u32) -> &str {
        let options = self.options;
        self.areuniq_names
            .entry(n)
            .or_insert_with(|| render(&options.areuniq_name, n))
    }

    fn uniqenum_name(&mut self, n: u32) -> &str {
        let options = self.options;
        self.uniqenum_names
            .entry(n)
            .or_insert_with(|| render(&options.uniqenum_name, n))
    }
}

fn render(template: &Template, n: u32) -> String {
    template.render(&[("n", Arg::Text(&n.to_string()))])
}

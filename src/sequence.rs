use log::debug;
use std::collections::HashSet;

use crate::descriptor::TypeDescriptor;
use crate::filter::FilterChain;
use crate::reflect::Reflector;

pub type RawClasses<'a> = Box<dyn Iterator<Item = (String, TypeDescriptor)> + 'a>;

/// Drops every pair whose name was already produced. First occurrence wins.
pub struct ClassSequence<'a> {
    inner: RawClasses<'a>,
    seen: HashSet<String>,
}

impl<'a> ClassSequence<'a> {
    pub fn new(inner: RawClasses<'a>) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
        }
    }
}

impl Iterator for ClassSequence<'_> {
    type Item = (String, TypeDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (name, descriptor) = self.inner.next()?;
            if self.seen.insert(name.clone()) {
                return Some((name, descriptor));
            }
            debug!("dropping duplicate {name}");
        }
    }
}

/// The lazy result of one finder iteration.
pub struct Classes<'a> {
    inner: ClassSequence<'a>,
    chain: FilterChain<'a>,
    reflector: &'a dyn Reflector,
}

impl<'a> Classes<'a> {
    pub fn new(inner: ClassSequence<'a>, chain: FilterChain<'a>, reflector: &'a dyn Reflector) -> Self {
        Self {
            inner,
            chain,
            reflector,
        }
    }
}

impl Iterator for Classes<'_> {
    type Item = (String, TypeDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        let chain = &self.chain;
        let reflector = self.reflector;
        self.inner
            .find(|(name, descriptor)| chain.accepts(name, descriptor, reflector))
    }
}

use pdf_writer::Ref;
use std::collections::HashMap;

/// Well-known objects of a generated PDF
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub enum RefType {
    Catalog,
    Info,
    PageTree,
    Font,
    CidFont,
    FontDescriptor,
    FontData,
    ToUnicode,
    Page(usize),
    Content(usize),
    Image(usize),
    ImageMask(usize),
}

/// Allocates object ids, remembering the ones other objects need to refer to
#[derive(Debug)]
pub struct ObjectReferences {
    refs: HashMap<RefType, Ref>,
    next_id: i32,
}

impl Default for ObjectReferences {
    fn default() -> Self {
        ObjectReferences::new()
    }
}

impl ObjectReferences {
    pub fn new() -> ObjectReferences {
        ObjectReferences {
            refs: HashMap::new(),
            next_id: 1,
        }
    }

    /// An id nothing else will refer to by type
    pub fn bump(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, ref_type: RefType) -> Option<Ref> {
        self.refs.get(&ref_type).copied()
    }

    pub fn gen(&mut self, ref_type: RefType) -> Ref {
        let id = self.bump();
        self.refs.insert(ref_type, id);
        id
    }

    /// The id of `ref_type`, allocating it on first use
    pub fn get_or_gen(&mut self, ref_type: RefType) -> Ref {
        match self.get(ref_type) {
            Some(id) => id,
            None => self.gen(ref_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut refs = ObjectReferences::new();
        let catalog = refs.gen(RefType::Catalog);
        let anonymous = refs.bump();
        assert_ne!(catalog, anonymous);
        assert_eq!(refs.get_or_gen(RefType::Catalog), catalog);
        assert_ne!(refs.get_or_gen(RefType::Page(0)), anonymous);
        assert_eq!(refs.get(RefType::Info), None);
    }
}

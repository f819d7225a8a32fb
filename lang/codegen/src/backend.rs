//! The capabilities a code generator must provide.
//!
//! [`Backend`] is all the compilation context needs to lay out its types and
//! globals; [`Emit`] additionally accepts the lowered code.

use crate::lir::{Continuation, InfoTable, Linkage, StaticClosure};
use std::fmt::Debug;

#[auto_impl::auto_impl(&mut, Box)]
pub trait Backend {
    type Type: Clone + Debug;
    type Field: Clone + Debug;
    type Global: Clone + Debug;
    type Location: Clone + Debug;

    fn void_type(&mut self) -> Self::Type;
    /// A signed integer as wide as a pointer.
    fn word_type(&mut self) -> Self::Type;
    /// An unsigned integer as wide as a pointer.
    fn unsigned_word_type(&mut self) -> Self::Type;
    fn pointer_type(&mut self, to: &Self::Type) -> Self::Type;
    fn function_ptr_type(&mut self, ret: &Self::Type, params: &[Self::Type]) -> Self::Type;
    fn new_field(
        &mut self, ty: &Self::Type, name: &str, loc: Option<&Self::Location>,
    ) -> Self::Field;
    fn new_struct_type(
        &mut self, name: &str, fields: Vec<Self::Field>, loc: Option<&Self::Location>,
    ) -> Self::Type;
    /// A struct whose fields are given later by [`Backend::set_fields`].
    fn new_opaque_struct_type(&mut self, name: &str, loc: Option<&Self::Location>) -> Self::Type;
    fn set_fields(
        &mut self, ty: &Self::Type, fields: Vec<Self::Field>, loc: Option<&Self::Location>,
    );
    /// `len == 0` is a flexible array.
    fn array_type(&mut self, elem: &Self::Type, len: usize) -> Self::Type;
    fn new_global(
        &mut self, linkage: Linkage, ty: &Self::Type, name: &str, loc: Option<&Self::Location>,
    ) -> Self::Global;
    fn new_location(&mut self, file: &str, line: usize, column: usize) -> Self::Location;
}

pub trait Emit: Backend {
    fn define_info_table(
        &mut self, types: &Types<Self::Type, Self::Field>, table: InfoTable,
        loc: Option<&Self::Location>,
    );
    fn define_continuation(
        &mut self, types: &Types<Self::Type, Self::Field>, cont: Continuation,
        loc: Option<&Self::Location>,
    );
    /// The static initializer of a global created by [`Backend::new_global`].
    fn define_global(
        &mut self, types: &Types<Self::Type, Self::Field>, global: &Self::Global,
        closure: StaticClosure,
    );
}

/// The type descriptors every program shares; built once, then read-only.
#[derive(Clone, Debug)]
pub struct Types<Ty, Fd> {
    pub word: Ty,
    /// arities are unsigned
    pub uword: Ty,
    /// `void (*)(void)`
    pub continuation: Ty,
    pub info_table: Ty,
    pub info_table_ptr: Ty,
    pub closure: Ty,
    pub closure_ptr: Ty,
    // info_table
    pub entry_code: Fd,
    pub arity: Fd,
    pub evacuation_code: Fd,
    pub scavenge_code: Fd,
    // closure
    pub info: Fd,
    pub freevars: Fd,
}

impl<Ty: Clone, Fd: Clone> Types<Ty, Fd> {
    pub fn new<B>(backend: &mut B) -> Self
    where
        B: Backend<Type = Ty, Field = Fd> + ?Sized,
    {
        let void = backend.void_type();
        let word = backend.word_type();
        let uword = backend.unsigned_word_type();
        let continuation = backend.function_ptr_type(&void, &[]);

        let entry_code = backend.new_field(&continuation, "entry_code", None);
        let arity = backend.new_field(&uword, "arity", None);
        let evacuation_code = backend.new_field(&continuation, "evacuation_code", None);
        let scavenge_code = backend.new_field(&continuation, "scavenge_code", None);
        let info_table = backend.new_struct_type(
            "info_table",
            vec![entry_code.clone(), arity.clone(), evacuation_code.clone(), scavenge_code.clone()],
            None,
        );
        let info_table_ptr = backend.pointer_type(&info_table);

        // closures point at closures
        let closure = backend.new_opaque_struct_type("closure", None);
        let closure_ptr = backend.pointer_type(&closure);
        let info = backend.new_field(&info_table_ptr, "info_table", None);
        let slots = backend.array_type(&closure_ptr, 0);
        let freevars = backend.new_field(&slots, "freevars", None);
        backend.set_fields(&closure, vec![info.clone(), freevars.clone()], None);

        Types {
            word,
            uword,
            continuation,
            info_table,
            info_table_ptr,
            closure,
            closure_ptr,
            entry_code,
            arity,
            evacuation_code,
            scavenge_code,
            info,
            freevars,
        }
    }
}

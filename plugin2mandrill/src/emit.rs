//! Serializing a converted [`Module`] to Mandrill source text.

use std::io::{self, Write};

use crate::convert::{Definition, Module};

/// Write a leading separator, every interned definition in
/// first-registration order, then the root block.
///
/// Registration order makes repeated runs over the same input byte-identical.
pub fn emit_module(writer: &mut impl Write, module: &Module) -> io::Result<()> {
    writeln!(writer)?;

    for definition in &module.definitions {
        emit_definition(writer, definition)?;
        writeln!(writer)?;
    }

    emit_definition(writer, &module.root)
}

fn emit_definition(writer: &mut impl Write, definition: &Definition) -> io::Result<()> {
    write!(writer, "{}", definition.prefix())?;
    write!(writer, "{}", definition.body())?;
    write!(writer, "{}", definition.postfix())
}

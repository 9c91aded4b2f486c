//! SAM header helpers: @PG chaining and the declared sort order.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::header::record::value::map::program::tag;
use std::collections::HashSet;

/// Program name and base @PG ID written to output headers.
pub const PROGRAM_NAME: &str = "covcap";

/// `SO` value for coordinate-sorted files.
pub const COORDINATE: &[u8] = b"coordinate";

/// ID of the last program in the @PG chain, i.e. the one no other program
/// names as its `PP`.
#[must_use]
pub fn get_last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let program_map = programs.as_ref();
    if program_map.is_empty() {
        return None;
    }

    let referenced: HashSet<&[u8]> = program_map
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| <_ as AsRef<[u8]>>::as_ref(pp))
        .collect();

    program_map
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| program_map.keys().next())
        .map(|id| String::from_utf8_lossy(id).to_string())
}

/// `base_id`, or `base_id.N` for the smallest N that is not already taken.
#[must_use]
pub fn make_unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let program_map = programs.as_ref();
    if !program_map.contains_key(base_id.as_bytes()) {
        return base_id.to_string();
    }
    (1..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !program_map.contains_key(candidate.as_bytes()))
        .unwrap_or_else(|| base_id.to_string())
}

/// Append a covcap @PG record chained to the existing last program.
///
/// # Errors
///
/// Returns an error if the program record cannot be built or added.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let previous_program = get_last_program_id(&header);
    let id = make_unique_program_id(&header, PROGRAM_NAME);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous_program.as_deref() {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }

    header.programs_mut().add(BString::from(id), builder.build()?)?;
    Ok(header)
}

/// The header's `SO` value, if any.
#[must_use]
pub fn sort_order(header: &Header) -> Option<&[u8]> {
    header
        .header()
        .and_then(|hdr| hdr.other_fields().get(&header_tag::SORT_ORDER))
        .map(|so| <_ as AsRef<[u8]>>::as_ref(so))
}

/// True if the header declares `SO:coordinate`.
#[must_use]
pub fn is_coordinate_sorted(header: &Header) -> bool {
    sort_order(header) == Some(COORDINATE)
}

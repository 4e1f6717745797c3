//! Reading `.block` catalogues and writing placement files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::catalog::{compare_block_names, BlockCatalog};
use crate::error::Result;
use crate::tree::FloorTree;

/// Loads a block catalogue from a `.block` file.
pub fn read_block_file(path: impl AsRef<Path>) -> Result<BlockCatalog> {
    let file = File::open(path)?;
    BlockCatalog::from_reader(BufReader::new(file))
}

/// Writes a packed floorplan in `.block` output format.
///
/// Three headers (area to 4 decimals, `W H` to 2, INL to 2, with non-normal
/// INL emitted as 0.00), then one line per block in name order with
/// coordinates to 3 decimals and the shape tuple to 2.
pub fn write_placement(
    out: &mut impl Write,
    catalog: &BlockCatalog,
    tree: &FloorTree,
) -> std::io::Result<()> {
    writeln!(out, "{:.4}", tree.chip_area)?;
    writeln!(out, "{:.2} {:.2}", tree.chip_width, tree.chip_height)?;
    let inl = if tree.inl.is_normal() { tree.inl } else { 0.0 };
    writeln!(out, "{inl:.2}")?;

    let mut rows: Vec<_> = tree
        .nodes
        .iter()
        .map(|node| {
            let block = catalog.get(node.block);
            (
                block.name.as_str(),
                node.x,
                node.y,
                block.variants[node.variant],
            )
        })
        .collect();
    rows.sort_by(|a, b| compare_block_names(a.0, b.0));

    for (name, x, y, shape) in rows {
        writeln!(
            out,
            "{name} {x:.3} {y:.3} ({:.2} {:.2} {} {})",
            shape.width, shape.height, shape.col_multiple, shape.row_multiple
        )?;
    }
    Ok(())
}

/// Writes the placement to a file, creating or truncating it.
pub fn write_placement_file(
    path: impl AsRef<Path>,
    catalog: &BlockCatalog,
    tree: &FloorTree,
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_placement(&mut writer, catalog, tree)?;
    writer.flush()?;
    Ok(())
}

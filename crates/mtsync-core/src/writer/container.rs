use std::path::Path;

use anyhow::Context;
use mp4ameta::{Data, FreeformIdent, Tag};

const MODIFICATION_DATE_MEAN: &str = "com.apple.iTunes";
const MODIFICATION_DATE_NAME: &str = "MODIFICATION_DATE";

fn modification_date_ident() -> FreeformIdent<'static> {
    FreeformIdent::new(MODIFICATION_DATE_MEAN, MODIFICATION_DATE_NAME)
}

/// Write `datetime` into the creation-date (`©day`) and modification-date tags
/// and persist the container's tag structure.
pub fn write_creation_date(path: &Path, datetime: &str) -> anyhow::Result<()> {
    let mut tag = Tag::read_from_path(path)
        .with_context(|| format!("Reading container tags of {}", path.display()))?;
    tag.set_year(datetime);
    tag.set_data(modification_date_ident(), Data::Utf8(datetime.to_string()));
    tag.write_to_path(path)
        .with_context(|| format!("Writing container tags to {}", path.display()))?;
    Ok(())
}

/// The creation-date tag, if the container has one.
pub fn read_creation_date(path: &Path) -> anyhow::Result<Option<String>> {
    let tag = Tag::read_from_path(path)
        .with_context(|| format!("Reading container tags of {}", path.display()))?;
    Ok(tag.year().map(str::to_string))
}

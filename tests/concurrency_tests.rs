//! Independent decodes and encodes share nothing and can run in parallel.

mod common;

use common::*;
use dwgcodec::{decode, encode, DwgDocument, DwgVersion, ObjectData};
use rayon::prelude::*;

#[test]
fn test_parallel_decode_of_every_revision() -> anyhow::Result<()> {
    let files: Vec<(DwgVersion, Vec<u8>)> = DwgVersion::ALL
        .iter()
        .map(|&v| Ok((v, encode(&sample_drawing(v), v)?)))
        .collect::<dwgcodec::Result<_>>()?;

    let docs: Vec<DwgDocument> = files
        .par_iter()
        .map(|(_, bytes)| decode(bytes))
        .collect::<dwgcodec::Result<_>>()?;

    for ((version, _), doc) in files.iter().zip(&docs) {
        assert_eq!(doc.version(), *version);
        assert_eq!(doc.len(), SAMPLE_OBJECTS);
        assert_eq!(doc.dangling_references(), 0);
    }
    Ok(())
}

#[test]
fn test_same_bytes_decoded_concurrently() -> anyhow::Result<()> {
    let bytes = encode(&sample_drawing(DwgVersion::AC1027), DwgVersion::AC1027)?;
    let lines: Vec<ObjectData> = (0..32)
        .into_par_iter()
        .map(|_| decode(&bytes).map(|doc| doc.get_by_handle(LINE).map(|o| o.data.clone())))
        .collect::<dwgcodec::Result<Vec<_>>>()?
        .into_iter()
        .map(|line| line.ok_or_else(|| anyhow::anyhow!("line missing")))
        .collect::<anyhow::Result<_>>()?;
    assert!(lines.windows(2).all(|w| w[0] == w[1]));
    Ok(())
}

#[test]
fn test_parallel_encode_is_deterministic() -> anyhow::Result<()> {
    let doc = sample_drawing(DwgVersion::AC1018);
    let outputs: Vec<Vec<u8>> = (0..8)
        .into_par_iter()
        .map(|_| encode(&doc, doc.version()))
        .collect::<dwgcodec::Result<_>>()?;
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    Ok(())
}

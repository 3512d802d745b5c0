use std::io::Read;

use super::*;
use crate::{batch::producer::SelectionRecord, render::surface::Surface};

fn rendered(index: usize, selections: &[(&str, &str)], source: Option<&str>) -> BatchEntry {
    BatchEntry::Rendered(GeneratedItem {
        index,
        surface: Surface::new(3, 2).unwrap(),
        selections: selections
            .iter()
            .map(|(l, t)| SelectionRecord {
                layer_name: l.to_string(),
                trait_display_name: t.to_string(),
            })
            .collect(),
        source_name: source.map(str::to_string),
    })
}

fn read_zip(bytes: &[u8]) -> zip::ZipArchive<std::io::Cursor<&[u8]>> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap()
}

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    archive.by_name(name).unwrap().read_to_end(&mut out).unwrap();
    out
}

#[test]
fn generated_layout_names_by_index() {
    let entries = vec![
        rendered(1, &[("Background", "Blue")], None),
        rendered(2, &[("Background", "Red")], None),
    ];
    let packed = pack(&entries, &PackOptions::generated("Punk #", "")).unwrap();
    let mut archive = read_zip(&packed.bytes);

    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        [
            "images/",
            "images/1.png",
            "images/2.png",
            "metadata/",
            "metadata/1.json",
            "metadata/2.json",
            "metadata_index.json",
        ]
    );

    let record: MetadataRecord =
        serde_json::from_slice(&read_entry(&mut archive, "metadata/2.json")).unwrap();
    assert_eq!(record.name, "Punk #2");
    assert_eq!(record.description, "Generated NFT");
    assert_eq!(record.image, "images/2.png");
    assert_eq!(record.attributes[0].value, "Red");

    let png = read_entry(&mut archive, "images/1.png");
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
}

#[test]
fn skipped_items_leave_null_gaps() {
    let entries = vec![
        rendered(1, &[], None),
        BatchEntry::Skipped {
            index: 2,
            reason: "asset decode failure".to_string(),
        },
        rendered(3, &[], None),
    ];
    let packed = pack(&entries, &PackOptions::generated("", "desc")).unwrap();
    let mut archive = read_zip(&packed.bytes);
    assert!(archive.by_name("images/2.png").is_err());

    let index: serde_json::Value =
        serde_json::from_slice(&read_entry(&mut archive, "metadata_index.json")).unwrap();
    let arr = index.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["name"], "NFT #1");
    assert!(arr[1].is_null());
    assert_eq!(arr[2]["description"], "desc");
    assert_eq!(packed.manifest.records().count(), 2);
}

#[test]
fn nothing_rendered_is_empty_input() {
    let entries = vec![BatchEntry::Skipped {
        index: 1,
        reason: "x".to_string(),
    }];
    let err = pack(&entries, &PackOptions::generated("", "")).unwrap_err();
    assert!(matches!(err, ForgeError::EmptyInput(_)));
    assert!(matches!(
        pack(&[], &PackOptions::generated("", "")),
        Err(ForgeError::EmptyInput(_))
    ));
}

#[test]
fn edited_layout_uses_stems_format_and_dedup() {
    let entries = vec![
        rendered(1, &[], Some("beach.JPG")),
        rendered(2, &[], Some("beach.png")),
        rendered(3, &[], Some("city.webp")),
    ];
    let export = ExportOptions {
        format: ExportFormat::Jpeg,
        jpg_quality: 0.8,
    };
    let packed = pack(&entries, &PackOptions::edited(export)).unwrap();
    let mut archive = read_zip(&packed.bytes);
    for name in ["images/beach.jpg", "images/beach_2.jpg", "images/city.jpg"] {
        let bytes = read_entry(&mut archive, name);
        let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }
    let record: MetadataRecord =
        serde_json::from_slice(&read_entry(&mut archive, "metadata/beach_2.json")).unwrap();
    assert_eq!(record.name, "beach_2");
    assert!(record.attributes.is_empty());
}

#[test]
fn quality_outside_range_is_rejected() {
    let surface = Surface::new(1, 1).unwrap();
    for q in [0.4, 1.01, f64::NAN] {
        let opts = ExportOptions {
            format: ExportFormat::Jpeg,
            jpg_quality: q,
        };
        assert!(matches!(
            encode_surface(&surface, &opts),
            Err(ForgeError::Validation(_))
        ));
    }
}

#[test]
fn png_keeps_alpha_and_jpeg_flattens_over_black() {
    let img = crate::assets::store::PreparedImage::from_premul(1, 1, vec![100, 0, 0, 128]).unwrap();
    let mut surface = Surface::new(1, 1).unwrap();
    surface
        .draw_image(&img, crate::foundation::core::Affine::IDENTITY)
        .unwrap();

    let png = encode_surface(&surface, &ExportOptions::default()).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [199, 0, 0, 128]);

    let jpeg = encode_surface(
        &surface,
        &ExportOptions {
            format: ExportFormat::Jpeg,
            jpg_quality: 1.0,
        },
    )
    .unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
    let [r, g, b] = decoded.get_pixel(0, 0).0;
    assert!((i32::from(r) - 100).abs() <= 8, "r = {r}");
    assert!(g <= 8 && b <= 8);
}

#[test]
fn single_selection_exports_one_file() {
    let export = ExportOptions::default();
    let one = vec![rendered(1, &[], Some("me.jpeg"))];
    let file = export_selection(&one, &export).unwrap();
    assert_eq!(file.file_name, "me.png");
    assert!(image::load_from_memory(&file.bytes).is_ok());

    let two = vec![rendered(1, &[], Some("a.png")), rendered(2, &[], Some("b.png"))];
    let file = export_selection(&two, &export).unwrap();
    assert_eq!(file.file_name, SELECTED_ARCHIVE_NAME);
    assert_eq!(read_zip(&file.bytes).len(), 7);
}

#[test]
fn selection_with_a_skipped_image_is_still_an_archive() {
    let entries = vec![
        rendered(1, &[], Some("kept.png")),
        BatchEntry::Skipped {
            index: 2,
            reason: "asset decode failure".to_string(),
        },
    ];
    let file = export_selection(&entries, &ExportOptions::default()).unwrap();
    assert_eq!(file.file_name, SELECTED_ARCHIVE_NAME);
    let mut archive = read_zip(&file.bytes);
    assert!(archive.by_name("images/kept.png").is_ok());

    let lone_skip = vec![BatchEntry::Skipped {
        index: 1,
        reason: "x".to_string(),
    }];
    assert!(matches!(
        export_selection(&lone_skip, &ExportOptions::default()),
        Err(ForgeError::EmptyInput(_))
    ));
}

#[test]
fn nameless_photo_gets_index_stem() {
    let item = match rendered(4, &[], Some(".png")) {
        BatchEntry::Rendered(item) => item,
        BatchEntry::Skipped { .. } => unreachable!(),
    };
    let file = export_single(&item, &ExportOptions::default()).unwrap();
    assert_eq!(file.file_name, "image_4.png");
}

use super::*;
use crate::assets::store::AssetKey;

const CANVAS: Canvas = Canvas {
    width: 8,
    height: 8,
};

fn solid(px: [u8; 4]) -> PreparedImage {
    PreparedImage::from_premul(2, 2, px.repeat(4)).unwrap()
}

fn fixture() -> (LayerStack, AssetStore) {
    let mut layers = LayerStack::new();
    let mut assets = AssetStore::new(".");

    layers.add_named_layer("Background");
    layers.add_trait(0, "red.png", AssetKey::new("bg/red.png")).unwrap();
    layers.add_trait(0, "blue.png", AssetKey::new("bg/blue.png")).unwrap();
    assets.insert_image(AssetKey::new("bg/red.png"), solid([255, 0, 0, 255]));
    assets.insert_image(AssetKey::new("bg/blue.png"), solid([0, 0, 255, 255]));

    layers.add_named_layer("Body");
    layers.add_trait(1, "ghost.png", AssetKey::new("body/ghost.png")).unwrap();
    layers.set_rarity(1, 0, 5.0).unwrap();
    assets.insert_image(AssetKey::new("body/ghost.png"), solid([0, 0, 0, 0]));

    layers.add_named_layer("Eyes");
    (layers, assets)
}

#[test]
fn composer_rejects_empty_stacks_and_bad_counts() {
    let assets = AssetStore::new(".");
    let mut layers = LayerStack::new();
    let err = TraitComposer::new(&layers, &assets, CANVAS, 5, 0).unwrap_err();
    assert!(matches!(err, ForgeError::EmptyInput(_)));

    layers.add_layer();
    let err = TraitComposer::new(&layers, &assets, CANVAS, 5, 0).unwrap_err();
    assert!(matches!(err, ForgeError::EmptyInput(_)));

    let (layers, assets) = fixture();
    for count in [0, 501] {
        let err = TraitComposer::new(&layers, &assets, CANVAS, count, 0).unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));
    }
}

#[test]
fn empty_layers_contribute_no_record() {
    let (layers, assets) = fixture();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 5, 42).unwrap();
    for index in 1..=5 {
        let item = composer.produce(index).unwrap();
        assert_eq!(item.index, index);
        assert_eq!((item.surface.width(), item.surface.height()), (8, 8));
        let names: Vec<_> = item.selections.iter().map(|s| s.layer_name.as_str()).collect();
        assert_eq!(names, ["Background", "Body"]);
        assert_eq!(item.selections[1].trait_display_name, "ghost");
        assert!(item.source_name.is_none());
    }
}

fn stack_with_empty_at(position: Option<usize>) -> LayerStack {
    let (full, _) = fixture();
    let mut out = LayerStack::new();
    let push_empty = |out: &mut LayerStack, at: usize| {
        if position == Some(at) {
            out.add_named_layer("Empty");
        }
    };
    for (li, layer) in full.layers().iter().filter(|l| !l.traits.is_empty()).enumerate() {
        push_empty(&mut out, li);
        let idx = out.len();
        out.add_named_layer(layer.name.clone());
        for (ti, t) in layer.traits.iter().enumerate() {
            out.add_trait(idx, t.source_name.clone(), t.image.clone()).unwrap();
            out.set_rarity(idx, ti, t.rarity).unwrap();
        }
    }
    push_empty(&mut out, 2);
    out
}

#[test]
fn empty_layer_is_inert_at_any_position() {
    let (_, assets) = fixture();
    let baseline = stack_with_empty_at(None);
    assert_eq!(baseline.len(), 2);
    for position in 0..=2 {
        let layers = stack_with_empty_at(Some(position));
        assert_eq!(layers.len(), 3);
        assert!(layers.layer(position).unwrap().traits.is_empty());

        let with_empty = TraitComposer::new(&layers, &assets, CANVAS, 6, 11).unwrap();
        let without = TraitComposer::new(&baseline, &assets, CANVAS, 6, 11).unwrap();
        for index in 1..=6 {
            let a = with_empty.produce(index).unwrap();
            let b = without.produce(index).unwrap();
            let names: Vec<_> = a.selections.iter().map(|s| s.layer_name.as_str()).collect();
            assert_eq!(names, ["Background", "Body"], "empty layer at {position}");
            assert_eq!(a.selections, b.selections);
            assert_eq!(a.surface, b.surface);
        }
    }
}

#[test]
fn surface_matches_picked_background() {
    let (layers, assets) = fixture();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 10, 3).unwrap();
    for index in 1..=10 {
        let item = composer.produce(index).unwrap();
        let expected = match item.selections[0].trait_display_name.as_str() {
            "red" => [255, 0, 0, 255],
            "blue" => [0, 0, 255, 255],
            other => panic!("unexpected trait {other}"),
        };
        assert!(item.surface.data().chunks_exact(4).all(|p| p == expected));
    }
}

#[test]
fn items_do_not_depend_on_production_order() {
    let (layers, assets) = fixture();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 6, 9).unwrap();
    let backwards: Vec<_> = (1..=6).rev().map(|i| composer.produce(i).unwrap()).collect();
    for item in backwards {
        assert_eq!(composer.produce(item.index).unwrap(), item);
    }
}

#[test]
fn different_seeds_change_some_picks() {
    let (layers, assets) = fixture();
    let a = TraitComposer::new(&layers, &assets, CANVAS, 40, 1).unwrap();
    let b = TraitComposer::new(&layers, &assets, CANVAS, 40, 2).unwrap();
    let differs = (1..=40).any(|i| {
        a.produce(i).unwrap().selections[0] != b.produce(i).unwrap().selections[0]
    });
    assert!(differs);
}

#[test]
fn undecodable_trait_keeps_record_but_skips_draw() {
    let (mut layers, assets) = fixture();
    layers.add_trait(2, "broken.png", AssetKey::new("eyes/broken.png")).unwrap();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 1, 0).unwrap();
    let item = composer.produce(1).unwrap();
    assert_eq!(item.selections.len(), 3);
    assert_eq!(item.selections[2].trait_display_name, "broken");
    assert_eq!(item.surface.pixel(0, 0).map(|p| p[3]), Some(255));
}

#[test]
fn out_of_range_index_is_rejected() {
    let (layers, assets) = fixture();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 2, 0).unwrap();
    assert!(composer.produce(0).is_err());
    assert!(composer.produce(3).is_err());
    assert_eq!(composer.len(), 2);
    assert!(!composer.is_empty());
}

#[test]
fn fingerprint_tracks_combination_only() {
    let (layers, assets) = fixture();
    let composer = TraitComposer::new(&layers, &assets, CANVAS, 20, 5).unwrap();
    let items: Vec<_> = (1..=20).map(|i| composer.produce(i).unwrap()).collect();
    for a in &items {
        for b in &items {
            assert_eq!(
                a.selections == b.selections,
                a.combination_fingerprint() == b.combination_fingerprint()
            );
        }
    }
}

fn photo_fixture() -> (PhotoSet, AssetStore) {
    let mut photos = PhotoSet::new();
    let mut assets = AssetStore::new(".");
    for (name, px) in [("a.png", [10, 10, 10, 255]), ("b.jpg", [20, 20, 20, 255])] {
        let key = AssetKey::new(name);
        photos.add(name, key.clone());
        assets.insert_image(key, solid(px));
    }
    (photos, assets)
}

#[test]
fn photo_producer_uses_selection_or_everything() {
    let (photos, assets) = photo_fixture();
    let mut selection = Selection::new();

    let all = PhotoProducer::new(&photos, &selection, &assets, ColorFilter::default()).unwrap();
    assert_eq!(all.len(), 2);

    selection.insert(photos.images()[1].id);
    let one = PhotoProducer::new(&photos, &selection, &assets, ColorFilter::default()).unwrap();
    assert_eq!(one.len(), 1);
    let item = one.produce(1).unwrap();
    assert_eq!(item.source_name.as_deref(), Some("b.jpg"));
    assert!(item.selections.is_empty());
    assert_eq!(item.surface.pixel(1, 1), Some([20, 20, 20, 255]));
}

#[test]
fn photo_producer_rejects_empty_set_and_bad_filter() {
    let empty = PhotoSet::new();
    let assets = AssetStore::new(".");
    let err = PhotoProducer::new(&empty, &Selection::new(), &assets, ColorFilter::default())
        .unwrap_err();
    assert!(matches!(err, ForgeError::EmptyInput(_)));

    let (photos, assets) = photo_fixture();
    let filter = ColorFilter {
        brightness: 9.0,
        ..ColorFilter::default()
    };
    let err = PhotoProducer::new(&photos, &Selection::new(), &assets, filter).unwrap_err();
    assert!(matches!(err, ForgeError::Validation(_)));
}

#[test]
fn photo_with_missing_pixels_is_an_item_local_error() {
    let (mut photos, assets) = photo_fixture();
    photos.add("gone.png", AssetKey::new("gone.png"));
    let producer =
        PhotoProducer::new(&photos, &Selection::new(), &assets, ColorFilter::default()).unwrap();
    let err = producer.produce(3).unwrap_err();
    assert!(err.is_item_local());
}

#[test]
fn photo_geometry_is_applied_per_image() {
    let (mut photos, mut assets) = photo_fixture();
    let key = AssetKey::new("grad.png");
    let data = [[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]].concat();
    assets.insert_image(key.clone(), PreparedImage::from_premul(2, 2, data).unwrap());
    let id = photos.add("grad.png", key);
    photos.rotate(id, 180.0).unwrap();

    let producer =
        PhotoProducer::new(&photos, &Selection::new(), &assets, ColorFilter::default()).unwrap();
    let item = producer.produce(3).unwrap();
    assert_eq!(item.surface.pixel(0, 0), Some([4, 0, 0, 255]));
    assert_eq!(item.surface.pixel(1, 1), Some([1, 0, 0, 255]));
}

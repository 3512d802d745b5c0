use super::*;

fn key(s: &str) -> AssetKey {
    AssetKey::new(s)
}

fn stack_with(counts: &[usize]) -> LayerStack {
    let mut stack = LayerStack::new();
    for (i, &n) in counts.iter().enumerate() {
        stack.add_layer();
        for j in 0..n {
            stack
                .add_trait(i, format!("t{i}_{j}.png"), key(&format!("l{i}/t{j}.png")))
                .unwrap();
        }
    }
    stack
}

#[test]
fn add_layer_names_by_position() {
    let mut stack = LayerStack::new();
    stack.add_layer();
    stack.add_layer();
    assert_eq!(stack.layers()[0].name, "Layer 1");
    assert_eq!(stack.layers()[1].name, "Layer 2");
    assert!(!stack.layers()[0].collapsed);
    assert_ne!(stack.layers()[0].id, stack.layers()[1].id);
}

#[test]
fn add_trait_strips_extension_and_defaults_rarity() {
    let mut stack = LayerStack::new();
    stack.add_named_layer("Eyes");
    stack.add_trait(0, "laser.eyes.png", key("eyes/laser.png")).unwrap();
    let t = &stack.layers()[0].traits[0];
    assert_eq!(t.source_name, "laser.eyes.png");
    assert_eq!(t.display_name, "laser.eyes");
    assert_eq!(t.rarity, DEFAULT_RARITY);
}

#[test]
fn removing_a_trait_leaves_other_layers_untouched() {
    let mut stack = stack_with(&[3, 4, 2]);
    let before: Vec<Vec<TraitId>> = stack
        .layers()
        .iter()
        .map(|l| l.traits.iter().map(|t| t.id).collect())
        .collect();

    let removed = stack.remove_trait(1, 2).unwrap();
    assert_eq!(removed.id, before[1][2]);

    let after: Vec<Vec<TraitId>> = stack
        .layers()
        .iter()
        .map(|l| l.traits.iter().map(|t| t.id).collect())
        .collect();
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1], vec![before[1][0], before[1][1], before[1][3]]);
}

#[test]
fn duplicate_inserts_copy_after_original_with_fresh_id() {
    let mut stack = stack_with(&[3]);
    stack.set_rarity(0, 1, 42.0).unwrap();
    let new_id = stack.duplicate_trait(0, 1).unwrap();

    let traits = &stack.layers()[0].traits;
    assert_eq!(traits.len(), 4);
    assert_eq!(traits[2].id, new_id);
    assert_ne!(traits[1].id, traits[2].id);
    assert_eq!(traits[2].display_name, traits[1].display_name);
    assert_eq!(traits[2].rarity, 42.0);
}

#[test]
fn move_trait_reorders_within_layer_only() {
    let mut stack = stack_with(&[3, 1]);
    let ids: Vec<TraitId> = stack.layers()[0].traits.iter().map(|t| t.id).collect();
    stack.move_trait(0, 0, 2).unwrap();
    let moved: Vec<TraitId> = stack.layers()[0].traits.iter().map(|t| t.id).collect();
    assert_eq!(moved, vec![ids[1], ids[2], ids[0]]);
    assert!(stack.move_trait(0, 0, 3).is_err());
}

#[test]
fn rarity_must_stay_within_slider_range() {
    let mut stack = stack_with(&[1]);
    assert!(stack.set_rarity(0, 0, -1.0).is_err());
    assert!(stack.set_rarity(0, 0, 100.5).is_err());
    assert!(stack.set_rarity(0, 0, f64::NAN).is_err());
    stack.set_rarity(0, 0, 0.0).unwrap();
    stack.set_rarity(0, 0, 100.0).unwrap();
}

#[test]
fn rename_toggle_and_remove_layer() {
    let mut stack = stack_with(&[1, 1]);
    stack.rename_layer(1, "Body").unwrap();
    stack.rename_trait(1, 0, "Robot").unwrap();
    assert!(stack.toggle_collapsed(1).unwrap());
    assert!(!stack.toggle_collapsed(1).unwrap());

    let removed = stack.remove_layer(0).unwrap();
    assert_eq!(removed.name, "Layer 1");
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.layers()[0].name, "Body");
    assert_eq!(stack.layers()[0].traits[0].display_name, "Robot");
}

#[test]
fn out_of_range_indices_are_validation_errors() {
    let mut stack = stack_with(&[1]);
    assert!(matches!(
        stack.remove_trait(0, 5),
        Err(ForgeError::Validation(_))
    ));
    assert!(matches!(stack.remove_layer(3), Err(ForgeError::Validation(_))));
    assert!(stack.add_trait(9, "x.png", key("x.png")).is_err());
}

#[test]
fn has_traits_ignores_empty_layers() {
    let stack = stack_with(&[0, 0]);
    assert!(!stack.has_traits());
    let stack = stack_with(&[0, 1]);
    assert!(stack.has_traits());
}

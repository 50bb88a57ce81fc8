//! Interactive questions asked before an action rolls.

use qr_core::{Item, ResourcePool};

/// Answer to the advantage prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvantageChoice {
    /// Sources of advantage.
    pub advantage: u32,
    /// Sources of disadvantage.
    pub disadvantage: u32,
}

/// Answer to the resource augmentation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AugmentChoice {
    /// Cost actually spent, at least the item's base cost.
    pub spent_cost: u32,
    /// Debit the spent cost from the actor's pool.
    pub consume_resources: bool,
    /// Place the area template.
    pub place_template: bool,
    /// Chosen target type for `coneOrLine` items.
    pub target_type: Option<String>,
}

/// Source of answers to interactive questions.
///
/// Returning `None` cancels the action.
pub trait PromptService {
    /// Ask whether to roll with advantage or disadvantage.
    fn ask_advantage(&mut self, item: &Item) -> Option<AdvantageChoice>;

    /// Ask how much of `pool` to spend on a superpower.
    fn ask_resource_augment(&mut self, item: &Item, pool: &ResourcePool) -> Option<AugmentChoice>;
}

/// Answers every question with its default: a plain roll, the base cost
/// paid from the pool, and no template.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl PromptService for NoPrompt {
    fn ask_advantage(&mut self, _item: &Item) -> Option<AdvantageChoice> {
        Some(AdvantageChoice::default())
    }

    fn ask_resource_augment(&mut self, item: &Item, _pool: &ResourcePool) -> Option<AugmentChoice> {
        Some(AugmentChoice {
            spent_cost: item.cost.unwrap_or(0),
            consume_resources: true,
            place_template: false,
            target_type: None,
        })
    }
}

/// Answers every question with a fixed reply. `None` cancels.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt {
    /// Reply to the advantage prompt.
    pub advantage: Option<AdvantageChoice>,
    /// Reply to the augmentation dialog.
    pub augment: Option<AugmentChoice>,
}

impl PromptService for FixedPrompt {
    fn ask_advantage(&mut self, _item: &Item) -> Option<AdvantageChoice> {
        self.advantage
    }

    fn ask_resource_augment(&mut self, _item: &Item, _pool: &ResourcePool) -> Option<AugmentChoice> {
        self.augment.clone()
    }
}

/// Whether a superpower opens the augmentation dialog.
pub fn needs_augment_dialog(item: &Item, pool: &ResourcePool) -> bool {
    let cost = item.cost.unwrap_or(0);
    item.has_placeable_template()
        || (cost > 0 && cost < pool.limit)
        || item.target.kind.as_deref() == Some("coneOrLine")
}

#[cfg(test)]
mod tests {
    use super::*;
    use qr_core::ItemKind;

    fn pool(limit: u32) -> ResourcePool {
        ResourcePool {
            remaining: limit,
            limit,
        }
    }

    #[test]
    fn dialog_for_augmentable_cost() {
        let mut item = Item::new(ItemKind::Superpower, "Bolt");
        item.cost = Some(1);
        assert!(needs_augment_dialog(&item, &pool(3)));
        assert!(!needs_augment_dialog(&item, &pool(1)));
        item.cost = Some(0);
        assert!(!needs_augment_dialog(&item, &pool(3)));
    }

    #[test]
    fn dialog_for_templates_and_cone_or_line() {
        let mut item = Item::new(ItemKind::Superpower, "Blast");
        item.target.kind = Some("cone".to_string());
        item.target.value = Some(15.0);
        assert!(needs_augment_dialog(&item, &pool(0)));

        let mut item = Item::new(ItemKind::Superpower, "Ray");
        item.target.kind = Some("coneOrLine".to_string());
        assert!(needs_augment_dialog(&item, &pool(0)));
    }

    #[test]
    fn no_prompt_defaults() {
        let mut item = Item::new(ItemKind::Superpower, "Bolt");
        item.cost = Some(2);
        let mut p = NoPrompt;
        assert_eq!(p.ask_advantage(&item), Some(AdvantageChoice::default()));
        let choice = p.ask_resource_augment(&item, &pool(5)).unwrap();
        assert_eq!(choice.spent_cost, 2);
        assert!(choice.consume_resources);
    }
}

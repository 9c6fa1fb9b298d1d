use crate::ident::sanitize;
use crate::models::draft::{BoxDetailsUpdate, ItemDraft};
use crate::models::lootbox::ClientItem;
use crate::services::LootBoxService;

/// Everything the operator-facing manager surface can ask the engine to do.
#[derive(Debug, Clone)]
pub enum ManagerAction {
    Open,
    AddItem { draft: ItemDraft },
    RemoveItem { item_id: String },
    AdjustStock { item_id: String, delta: i64 },
    SetMaxWins { item_id: String, max_wins: Option<u32> },
    EditBox { update: BoxDetailsUpdate },
    Reset,
    /// Deletion demands the operator retype the box id; the engine itself
    /// never checks the token.
    RemoveLootBox { confirm: String },
}

/// What an action run hands back to the host's template layer. The three
/// output strings are only populated by `Open`.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub success: bool,
    pub winning_item: String,
    pub winning_value: String,
    /// Remaining stock after the draw; blank when unlimited
    pub remaining_stock: String,
}

impl ActionOutcome {
    fn failure() -> Self {
        Self::default()
    }

    fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Runs one manager action against the engine. Bad input and missing
/// records come back as a failed outcome with a logged warning; nothing in
/// here panics or throws past the boundary.
pub async fn run_action(
    engine: &LootBoxService,
    raw_box_id: &str,
    action: ManagerAction,
) -> ActionOutcome {
    let box_id = sanitize(raw_box_id);
    if box_id.is_empty() {
        tracing::warn!(raw = %raw_box_id, "manager action refused: invalid loot box id");
        return ActionOutcome::failure();
    }

    let result = dispatch(engine, &box_id, action).await;
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(box_id = %box_id, error = %e, "manager action failed");
            ActionOutcome::failure()
        }
    }
}

async fn dispatch(
    engine: &LootBoxService,
    box_id: &str,
    action: ManagerAction,
) -> crate::error::AppResult<ActionOutcome> {
    match action {
        ManagerAction::Open => {
            let Some(selection) = engine.open_loot_box(box_id).await? else {
                tracing::warn!(box_id = %box_id, "no available items to open");
                return Ok(ActionOutcome::failure());
            };

            let item = ClientItem::from(&selection.item);
            Ok(ActionOutcome {
                success: true,
                winning_item: item.label,
                winning_value: item.value,
                remaining_stock: item.remaining.map(|r| r.to_string()).unwrap_or_default(),
            })
        }
        ManagerAction::AddItem { draft } => {
            if draft.label.as_deref().map(str::trim).unwrap_or("").is_empty() {
                tracing::warn!(box_id = %box_id, "add item refused: a label is required");
                return Ok(ActionOutcome::failure());
            }
            if let Some(weight) = draft.weight {
                if !weight.is_finite() || weight <= 0.0 {
                    tracing::warn!(box_id = %box_id, weight, "add item refused: weight must be positive");
                    return Ok(ActionOutcome::failure());
                }
            }
            engine.add_item(box_id, draft).await?;
            Ok(ActionOutcome::ok())
        }
        ManagerAction::RemoveItem { item_id } => {
            if engine.remove_item(box_id, &item_id).await? {
                Ok(ActionOutcome::ok())
            } else {
                tracing::warn!(box_id = %box_id, item_id = %item_id, "unable to remove item");
                Ok(ActionOutcome::failure())
            }
        }
        ManagerAction::AdjustStock { item_id, delta } => {
            if sanitize(&item_id).is_empty() {
                tracing::warn!(box_id = %box_id, "adjust stock refused: select an item");
                return Ok(ActionOutcome::failure());
            }
            if delta == 0 {
                tracing::warn!(box_id = %box_id, item_id = %item_id, "adjust stock refused: delta must be non-zero");
                return Ok(ActionOutcome::failure());
            }
            match engine.adjust_item_remaining(box_id, &item_id, delta).await? {
                Some(_) => Ok(ActionOutcome::ok()),
                None => {
                    tracing::warn!(box_id = %box_id, item_id = %item_id, "unable to adjust stock");
                    Ok(ActionOutcome::failure())
                }
            }
        }
        ManagerAction::SetMaxWins { item_id, max_wins } => {
            match engine.set_item_max_wins(box_id, &item_id, max_wins).await? {
                Some(_) => Ok(ActionOutcome::ok()),
                None => {
                    tracing::warn!(box_id = %box_id, item_id = %item_id, "unable to set max wins");
                    Ok(ActionOutcome::failure())
                }
            }
        }
        ManagerAction::EditBox { update } => {
            match engine.update_loot_box_details(box_id, update).await? {
                Some(_) => Ok(ActionOutcome::ok()),
                None => {
                    tracing::warn!(box_id = %box_id, "unable to edit loot box: not found");
                    Ok(ActionOutcome::failure())
                }
            }
        }
        ManagerAction::Reset => match engine.reset_loot_box(box_id).await? {
            Some(_) => Ok(ActionOutcome::ok()),
            None => {
                tracing::warn!(box_id = %box_id, "unable to reset loot box: not found");
                Ok(ActionOutcome::failure())
            }
        },
        ManagerAction::RemoveLootBox { confirm } => {
            if sanitize(&confirm) != box_id {
                tracing::warn!(box_id = %box_id, "removal refused: confirmation token does not match");
                return Ok(ActionOutcome::failure());
            }
            if engine.remove_loot_box(box_id).await? {
                Ok(ActionOutcome::ok())
            } else {
                tracing::warn!(box_id = %box_id, "unable to remove loot box: not found");
                Ok(ActionOutcome::failure())
            }
        }
    }
}

//! `item search` and `tp price`.

use serde::Deserialize;
use tyria_core::account::PriceListing;
use tyria_core::card::{MessageCard, Reply};
use tyria_core::catalog::Catalog;
use tyria_core::currencies::format_coins;
use tyria_core::error::ApiError;
use tyria_db::models::reference::ReferenceEntry;
use tyria_db::repositories::ReferenceRepo;
use validator::Validate;

use super::{find_cached, CommandError, Invocation};
use crate::state::AppState;

const SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct NameArgs {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

fn rarity(entry: &ReferenceEntry) -> Option<&str> {
    entry.data.0.get("rarity").and_then(|r| r.as_str())
}

pub fn search_card(query: &str, entries: &[ReferenceEntry]) -> MessageCard {
    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            let name = e.name.as_deref().unwrap_or("?");
            match rarity(e) {
                Some(rarity) => format!("{name} ({rarity}) `{}`", e.id),
                None => format!("{name} `{}`", e.id),
            }
        })
        .collect();
    MessageCard::new(format!("Items matching \"{query}\"")).description(lines.join("\n"))
}

pub async fn item_search(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: NameArgs = inv.args()?;
    let query = args.name.trim();
    let entries = ReferenceRepo::search_by_name(&state.pool, Catalog::Items, query, SEARCH_LIMIT).await?;
    if entries.is_empty() {
        return Ok(Reply::text(format!("No item matching \"{query}\" was found.")));
    }
    Ok(search_card(query, &entries).into())
}

pub fn price_card(item: &str, listing: &PriceListing) -> MessageCard {
    MessageCard::new(format!("Trading post: {item}"))
        .field(
            "Buy orders",
            format!(
                "{} ({} ordered)",
                format_coins(listing.buys.unit_price),
                listing.buys.quantity
            ),
            true,
        )
        .field(
            "Sell listings",
            format!(
                "{} ({} listed)",
                format_coins(listing.sells.unit_price),
                listing.sells.quantity
            ),
            true,
        )
}

pub async fn tp_price(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: NameArgs = inv.args()?;
    let Some(item) = find_cached(state, Catalog::Items, &args.name).await? else {
        return Ok(Reply::text(format!("No item matching \"{}\" was found.", args.name.trim())));
    };
    let name = item.name.clone().unwrap_or_else(|| item.id.to_string());

    match state
        .gateway
        .get::<PriceListing>(&format!("commerce/prices/{}", item.id))
        .await
    {
        Ok(listing) => Ok(price_card(&name, &listing).into()),
        Err(ApiError::NotFound) => Ok(Reply::text(format!(
            "{name} can't be traded on the trading post."
        ))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlx::types::Json;
    use tyria_core::account::PriceSide;

    use super::*;

    #[test]
    fn search_lists_rarity_when_known() {
        let entries = vec![
            ReferenceEntry {
                id: 19700,
                name: Some("Mithril Ore".into()),
                data: Json(json!({"rarity": "Basic"})),
            },
            ReferenceEntry {
                id: 19684,
                name: Some("Mithril Ingot".into()),
                data: Json(json!({})),
            },
        ];
        let card = search_card("mithril", &entries);
        assert_eq!(
            card.description.as_deref(),
            Some("Mithril Ore (Basic) `19700`\nMithril Ingot `19684`")
        );
    }

    #[test]
    fn price_card_formats_coins() {
        let listing = PriceListing {
            id: 1,
            buys: PriceSide {
                quantity: 12,
                unit_price: 10_203,
            },
            sells: PriceSide {
                quantity: 3,
                unit_price: 95,
            },
        };
        let card = price_card("Thing", &listing);
        assert_eq!(card.fields[0].value, "1g 2s 3c (12 ordered)");
        assert_eq!(card.fields[1].value, "95c (3 listed)");
    }
}

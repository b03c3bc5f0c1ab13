mod common;

use anyhow::Result;
use atrium_api::query::QueryError;
use common::*;

// Filter correctness, pagination arithmetic and sort behavior, all through
// the full pipeline against the seeded in-memory gateway.

#[tokio::test]
async fn price_scenario_returns_three_lowest_available_matches() -> Result<()> {
    let world = seed_world().await;
    let store = STORE_S.to_string();
    let ingredient = INGREDIENT_I.to_string();
    let request = raw(&[
        ("store_id", &store),
        ("ingredient_id", &ingredient),
        ("available", "true"),
        ("min_price", "100"),
        ("max_price", "200"),
        ("sort", "price"),
        ("order", "asc"),
        ("page", "1"),
        ("limit", "3"),
    ]);

    let result = world
        .search
        .search("ingredient_prices", &request, Some(&org_admin(STORE_S)))
        .await?;

    let prices: Vec<i64> = result.data.iter().map(|r| r["price"].as_i64().unwrap()).collect();
    assert_eq!(prices, vec![100, 120, 140]);
    assert_eq!(result.pagination.current, 1);
    assert_eq!(result.pagination.limit, 3);
    assert_eq!(result.pagination.records, 3);
    Ok(())
}

#[tokio::test]
async fn every_returned_item_satisfies_every_predicate() -> Result<()> {
    let world = seed_world().await;
    let request = raw(&[("available", "true"), ("min_price", "110"), ("max_price", "130")]);
    let result = world
        .search
        .search("ingredient_prices", &request, Some(&org_admin(STORE_S)))
        .await?;

    assert!(!result.data.is_empty());
    for item in &result.data {
        assert_eq!(item["available"], serde_json::json!(true));
        let price = item["price"].as_i64().unwrap();
        assert!((110..=130).contains(&price), "price {} out of range", price);
    }
    Ok(())
}

#[tokio::test]
async fn concatenating_all_pages_yields_every_record_once() -> Result<()> {
    let world = seed_world().await;
    let admin = org_admin(STORE_S);

    let first = world
        .search
        .search("ingredient_prices", &raw(&[("limit", "2")]), Some(&admin))
        .await?;
    assert_eq!(first.pagination.records, 6); // 5 for ingredient I + 1 for J
    assert_eq!(first.pagination.pages, 3);

    let mut seen = std::collections::HashSet::new();
    let mut total = 0;
    for page in 1..=first.pagination.pages {
        let page_str = page.to_string();
        let result = world
            .search
            .search("ingredient_prices", &raw(&[("limit", "2"), ("page", &page_str)]), Some(&admin))
            .await?;
        for item in &result.data {
            assert!(seen.insert(item["id"].as_str().unwrap().to_string()), "duplicate across pages");
            total += 1;
        }
    }
    assert_eq!(total, first.pagination.records);
    Ok(())
}

#[tokio::test]
async fn out_of_range_page_returns_empty_data_with_unchanged_metadata() -> Result<()> {
    let world = seed_world().await;
    let admin = org_admin(STORE_S);
    let request = raw(&[("available", "true"), ("limit", "3")]);
    let first = world.search.search("ingredient_prices", &request, Some(&admin)).await?;

    let request = raw(&[("available", "true"), ("limit", "3"), ("page", "7")]);
    let beyond = world.search.search("ingredient_prices", &request, Some(&admin)).await?;

    assert!(beyond.data.is_empty());
    assert_eq!(beyond.pagination.records, first.pagination.records);
    assert_eq!(beyond.pagination.pages, first.pagination.pages);
    assert_eq!(beyond.pagination.current, 7);
    Ok(())
}

#[tokio::test]
async fn sort_is_monotone_in_both_directions() -> Result<()> {
    let world = seed_world().await;
    let admin = org_admin(STORE_S);

    let asc = world
        .search
        .search("ingredient_prices", &raw(&[("sort", "price"), ("order", "asc")]), Some(&admin))
        .await?;
    let prices: Vec<i64> = asc.data.iter().map(|r| r["price"].as_i64().unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]), "not ascending: {:?}", prices);

    let desc = world
        .search
        .search("ingredient_prices", &raw(&[("sort", "price"), ("order", "desc")]), Some(&admin))
        .await?;
    let prices: Vec<i64> = desc.data.iter().map(|r| r["price"].as_i64().unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] >= w[1]), "not descending: {:?}", prices);
    Ok(())
}

#[tokio::test]
async fn invalid_pagination_is_rejected_before_any_gateway_call() -> Result<()> {
    let world = seed_world().await;
    let admin = org_admin(STORE_S);
    let calls_before = world.gateway.call_count();

    let err = world
        .search
        .search("ingredient_prices", &raw(&[("page", "-1")]), Some(&admin))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Validation(_)));

    let err = world
        .search
        .search("ingredient_prices", &raw(&[("limit", "0")]), Some(&admin))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Validation(_)));

    assert_eq!(world.gateway.call_count(), calls_before);
    Ok(())
}

#[tokio::test]
async fn unauthenticated_search_is_rejected_before_any_gateway_call() -> Result<()> {
    let world = seed_world().await;
    let calls_before = world.gateway.call_count();

    let err = world
        .search
        .search("ingredient_prices", &raw(&[]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Authentication(_)));
    assert_eq!(world.gateway.call_count(), calls_before);
    Ok(())
}

#[tokio::test]
async fn empty_result_uses_the_resource_pages_convention() -> Result<()> {
    let world = seed_world().await;
    let missing = uuid::Uuid::from_u128(0xDEAD).to_string();

    // ingredient_prices documents pages = 1 for an empty result
    let result = world
        .search
        .search("ingredient_prices", &raw(&[("ingredient_id", &missing)]), Some(&org_admin(STORE_S)))
        .await?;
    assert_eq!(result.pagination.records, 0);
    assert_eq!(result.pagination.pages, 1);
    assert!(result.data.is_empty());

    // appointments documents pages = 0
    let result = world
        .search
        .search("appointments", &raw(&[("patient_id", &missing)]), Some(&org_admin(ORG_A)))
        .await?;
    assert_eq!(result.pagination.records, 0);
    assert_eq!(result.pagination.pages, 0);
    Ok(())
}

#[tokio::test]
async fn archived_rows_are_hidden_unless_an_admin_opts_in() -> Result<()> {
    let world = seed_world().await;
    world
        .gateway
        .seed(
            "ingredient_prices",
            price_row(uuid::Uuid::from_u128(0x2FFF), STORE_S, INGREDIENT_I, 999, true, Some("2026-02-01T00:00:00+00:00")),
        )
        .await;
    let admin = org_admin(STORE_S);

    let hidden = world
        .search
        .search("ingredient_prices", &raw(&[("min_price", "999")]), Some(&admin))
        .await?;
    assert_eq!(hidden.pagination.records, 0);

    let shown = world
        .search
        .search(
            "ingredient_prices",
            &raw(&[("min_price", "999"), ("include_archived", "true")]),
            Some(&admin),
        )
        .await?;
    assert_eq!(shown.pagination.records, 1);

    // The opt-out is scope-checked: staff asking for it still see nothing
    let staff_view = world
        .search
        .search(
            "ingredient_prices",
            &raw(&[("min_price", "999"), ("include_archived", "true")]),
            Some(&staff(STORE_S, PRACT_1)),
        )
        .await?;
    assert_eq!(staff_view.pagination.records, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_field_falls_back_to_default_order() -> Result<()> {
    let world = seed_world().await;
    let result = world
        .search
        .search("ingredient_prices", &raw(&[("sort", "created_by")]), Some(&org_admin(STORE_S)))
        .await?;
    // default sort is price asc
    let prices: Vec<i64> = result.data.iter().map(|r| r["price"].as_i64().unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    Ok(())
}

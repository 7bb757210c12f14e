// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform connector tests against local mock servers.

use chrono::{Duration, Utc};
use funnel_optimizer::models::{Platform, PlatformSnapshot};
use funnel_optimizer::services::connectors::{
    build_connector, ConnectionInfo, Connector, ConnectorEndpoints, GoogleAnalyticsConnector,
    HubSpotConnector, LeadImport, PlatformCredentials, ShopifyConnector,
};
use httpmock::prelude::*;
use serde_json::json;

mod common;

fn shopify(server: &MockServer) -> ShopifyConnector {
    ShopifyConnector::new(
        reqwest::Client::new(),
        "acme",
        "shpat_test".to_string(),
        "hooks.example.com".to_string(),
    )
    .with_base_url(server.base_url())
}

fn hubspot(server: &MockServer) -> HubSpotConnector {
    HubSpotConnector::new(reqwest::Client::new(), "pat-test".to_string())
        .with_base_url(server.base_url())
}

fn analytics(server: &MockServer) -> GoogleAnalyticsConnector {
    GoogleAnalyticsConnector::new(
        reqwest::Client::new(),
        "123456".to_string(),
        "ya29.test".to_string(),
    )
    .with_base_url(server.base_url())
}

fn recent() -> String {
    (Utc::now() - Duration::days(1)).to_rfc3339()
}

// ═══════════════════════════════════════════════════════════════════════════
// SHOPIFY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_shopify_authenticate() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/shop.json")
                .header("X-Shopify-Access-Token", "shpat_test");
            then.status(200).json_body(json!({
                "shop": {
                    "name": "Acme Outdoor",
                    "domain": "acme.example.com",
                    "currency": "USD",
                    "plan_name": "basic"
                }
            }));
        })
        .await;

    let info = shopify(&server).authenticate().await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        info,
        ConnectionInfo::Shopify {
            shop_name: "Acme Outdoor".to_string(),
            domain: "acme.example.com".to_string(),
            currency: "USD".to_string(),
            plan: "basic".to_string(),
        }
    );
}

#[tokio::test]
async fn test_shopify_auth_and_rate_limit_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/shop.json");
            then.status(401).body("Invalid API key");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/orders.json");
            then.status(429);
        })
        .await;

    let connector = shopify(&server);
    assert!(connector
        .authenticate()
        .await
        .unwrap_err()
        .is_platform_auth_error());
    assert!(connector
        .historical_data(30)
        .await
        .unwrap_err()
        .is_rate_limited());
}

#[tokio::test]
async fn test_shopify_historical_data_tolerates_optional_scopes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orders.json")
                .query_param("status", "any")
                .query_param_exists("created_at_min");
            then.status(200).json_body(json!({
                "orders": [
                    { "email": "a@example.com", "total_price": "100.00" },
                    { "email": "b@example.com", "total_price": "50.50" }
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/products.json");
            then.status(403);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts.json");
            then.status(200)
                .json_body(json!({ "checkouts": [{ "email": "c@example.com" }] }));
        })
        .await;

    let snapshot = shopify(&server).historical_data(30).await.unwrap();

    match snapshot {
        PlatformSnapshot::Shopify {
            period_days,
            metrics,
            ..
        } => {
            assert_eq!(period_days, 30);
            assert_eq!(metrics.total_orders, 2);
            assert!((metrics.total_revenue - 150.5).abs() < 1e-9);
            assert!((metrics.average_order_value - 75.25).abs() < 1e-9);
            assert_eq!(metrics.total_products, 0);
            assert_eq!(metrics.abandoned_checkouts, 1);
            assert!((metrics.cart_abandonment_rate - 100.0 / 3.0).abs() < 1e-9);
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }
}

#[tokio::test]
async fn test_shopify_fetch_leads_skips_customers_without_email() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/customers.json");
            then.status(200).json_body(json!({
                "customers": [
                    { "email": "First@Example.com", "orders_count": 0 },
                    { "email": null, "phone": "+15550100" },
                    { "email": "repeat@example.com", "orders_count": 2, "total_spent": "80.00" }
                ]
            }));
        })
        .await;

    let leads = match shopify(&server).fetch_leads("f1", 30).await.unwrap() {
        LeadImport::Leads(leads) => leads,
        other => panic!("unexpected import: {other:?}"),
    };

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].email, "first@example.com");
    assert_eq!(leads[0].funnel_id, "f1");
    assert!(leads[1].converted_to_customer);
}

#[tokio::test]
async fn test_shopify_webhooks_count_created_only() {
    let server = MockServer::start_async().await;
    let created = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/webhooks.json")
                .body_contains("hooks.example.com/api/webhooks/shopify/f1/");
            then.status(201)
                .json_body(json!({ "webhook": { "id": 1, "format": "json" } }));
        })
        .await;

    let setup = shopify(&server).setup_webhooks("f1").await.unwrap();

    created.assert_hits_async(3).await;
    assert!(setup.success);
    assert_eq!(setup.webhooks_created, 3);
    assert_eq!(setup.webhooks[0]["id"], 1);
}

#[tokio::test]
async fn test_shopify_webhooks_all_rejected() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST).path("/webhooks.json");
            then.status(422)
                .json_body(json!({ "errors": { "address": ["for this topic has already been taken"] } }));
        })
        .await;

    let setup = shopify(&server).setup_webhooks("f1").await.unwrap();

    rejected.assert_hits_async(3).await;
    assert!(!setup.success);
    assert_eq!(setup.webhooks_created, 0);
    assert!(setup.error.is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// HUBSPOT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_hubspot_authenticate() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/account-info/v3/details")
                .header("Authorization", "Bearer pat-test");
            then.status(200).json_body(json!({
                "portalId": 4242,
                "currencyCode": "EUR",
                "timeZone": "Europe/Berlin"
            }));
        })
        .await;

    let info = hubspot(&server).authenticate().await.unwrap();

    assert_eq!(
        info,
        ConnectionInfo::HubSpot {
            portal_id: Some(4242),
            currency: Some("EUR".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
        }
    );
}

#[tokio::test]
async fn test_hubspot_historical_data_follows_cursor() {
    let server = MockServer::start_async().await;
    let created = recent();

    // Registered first so the cursor request matches it before the general mock
    let second_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/crm/v3/objects/deals")
                .query_param("after", "page2");
            then.status(200).json_body(json!({
                "results": [
                    { "id": "3", "properties": { "dealstage": "closedwon", "amount": "500", "createdate": created } }
                ]
            }));
        })
        .await;
    let first_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/crm/v3/objects/deals")
                .query_param("limit", "100");
            then.status(200).json_body(json!({
                "results": [
                    { "id": "1", "properties": { "dealstage": "closedwon", "amount": "1500.00", "createdate": created } },
                    { "id": "2", "properties": { "dealstage": "appointmentscheduled", "amount": "900", "createdate": created } }
                ],
                "paging": { "next": { "after": "page2" } }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/crm/v3/objects/contacts");
            then.status(200).json_body(json!({
                "results": [
                    { "id": "10", "properties": { "email": "m@example.com", "lifecyclestage": "marketingqualifiedlead", "createdate": created } },
                    { "id": "11", "properties": { "email": "s@example.com", "lifecyclestage": "salesqualifiedlead", "createdate": created } }
                ]
            }));
        })
        .await;

    let snapshot = hubspot(&server).historical_data(30).await.unwrap();

    first_page.assert_hits_async(1).await;
    second_page.assert_hits_async(1).await;
    match snapshot {
        PlatformSnapshot::HubSpot {
            metrics,
            baseline_data,
            ..
        } => {
            assert_eq!(metrics.total_deals, 3);
            assert_eq!(metrics.closed_won_deals, 2);
            assert!((metrics.total_revenue - 2000.0).abs() < 1e-9);
            assert!((metrics.average_deal_value - 1000.0).abs() < 1e-9);
            assert_eq!(metrics.total_contacts, 2);
            assert_eq!(metrics.mql_count, 1);
            assert_eq!(metrics.sql_count, 1);
            assert!((baseline_data.mql_to_sql_rate - 100.0).abs() < 1e-9);
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }
}

#[tokio::test]
async fn test_hubspot_get_contact() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/crm/v3/objects/contacts/501")
                .query_param_exists("properties");
            then.status(200).json_body(json!({
                "id": "501",
                "properties": { "email": "new@example.com", "lifecyclestage": "lead" }
            }));
        })
        .await;

    let contact = hubspot(&server).get_contact("501").await.unwrap();

    assert_eq!(contact.id, "501");
    assert_eq!(contact.prop("email"), Some("new@example.com"));
}

#[tokio::test]
async fn test_hubspot_webhooks_are_manual() {
    let server = MockServer::start_async().await;

    let setup = hubspot(&server).setup_webhooks("f1").await.unwrap();

    assert_eq!(setup.webhooks_created, 0);
    assert!(setup.available.contains(&"contact.creation".to_string()));
}

// ═══════════════════════════════════════════════════════════════════════════
// GOOGLE ANALYTICS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_analytics_historical_data_sums_rows() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/properties/123456:runReport")
                .body_contains("totalUsers");
            then.status(200).json_body(json!({
                "rows": [
                    {
                        "dimensionValues": [{ "value": "20260101" }, { "value": "google" }, { "value": "organic" }],
                        "metricValues": [{ "value": "100" }, { "value": "80" }, { "value": "250" }, { "value": "0.4" }, { "value": "3" }, { "value": "300.5" }]
                    },
                    {
                        "dimensionValues": [{ "value": "20260102" }, { "value": "(direct)" }, { "value": "(none)" }],
                        "metricValues": [{ "value": "100" }, { "value": "70" }, { "value": "150" }, { "value": "0.6" }, { "value": "1" }, { "value": "99.5" }]
                    }
                ]
            }));
        })
        .await;

    let snapshot = analytics(&server).historical_data(7).await.unwrap();

    match snapshot {
        PlatformSnapshot::GoogleAnalytics {
            period_days,
            metrics,
            baseline_data,
        } => {
            assert_eq!(period_days, 7);
            assert_eq!(metrics.total_sessions, 200);
            assert_eq!(metrics.total_users, 150);
            assert_eq!(metrics.total_conversions, 4);
            assert!((metrics.total_revenue - 400.0).abs() < 1e-9);
            assert!((metrics.avg_bounce_rate - 0.5).abs() < 1e-9);
            assert!((baseline_data.conversion_rate - 2.0).abs() < 1e-9);
            assert!((baseline_data.pages_per_session - 2.0).abs() < 1e-9);
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }
}

#[tokio::test]
async fn test_analytics_conversion_report_failure_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/properties/123456:runReport")
                .body_contains("eventName");
            then.status(403);
        })
        .await;

    let import = analytics(&server).fetch_leads("f1", 30).await.unwrap();

    assert_eq!(import, LeadImport::ConversionEvents(Vec::new()));
}

#[tokio::test]
async fn test_analytics_conversion_events_filtered_by_name() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/properties/123456:runReport")
                .body_contains("eventName");
            then.status(200).json_body(json!({
                "rows": [
                    {
                        "dimensionValues": [{ "value": "purchase" }, { "value": "google" }, { "value": "cpc" }],
                        "metricValues": [{ "value": "5" }, { "value": "250" }]
                    },
                    {
                        "dimensionValues": [{ "value": "page_view" }, { "value": "google" }, { "value": "cpc" }],
                        "metricValues": [{ "value": "900" }, { "value": "0" }]
                    },
                    {
                        "dimensionValues": [{ "value": "generate_Lead" }, { "value": "bing" }, { "value": "organic" }],
                        "metricValues": [{ "value": "2" }, { "value": "0" }]
                    }
                ]
            }));
        })
        .await;

    let events = match analytics(&server).fetch_leads("f1", 30).await.unwrap() {
        LeadImport::ConversionEvents(events) => events,
        other => panic!("unexpected import: {other:?}"),
    };

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_name, "purchase");
    assert_eq!(events[0].conversions, 5);
    assert_eq!(events[1].source, "bing");
}

// ═══════════════════════════════════════════════════════════════════════════
// ORCHESTRATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_build_connector_uses_endpoint_override() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/properties/987/metadata");
            then.status(200).json_body(json!({ "name": "properties/987/metadata" }));
        })
        .await;

    let endpoints = ConnectorEndpoints {
        google_analytics: Some(server.base_url()),
        ..Default::default()
    };
    let connector = build_connector(
        Platform::GoogleAnalytics,
        reqwest::Client::new(),
        PlatformCredentials {
            access_token: "ya29.test".to_string(),
            shop_domain: None,
            property_id: Some("987".to_string()),
        },
        "hooks.example.com",
        &endpoints,
    )
    .unwrap();

    let info = connector.authenticate().await.unwrap();

    mock.assert_async().await;
    assert_eq!(connector.platform(), Platform::GoogleAnalytics);
    assert_eq!(
        info,
        ConnectionInfo::GoogleAnalytics {
            property_id: "987".to_string(),
            access_type: "read".to_string(),
        }
    );
}

#[tokio::test]
async fn test_connection_test_succeeds_with_offline_usage_tracking() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/account-info/v3/details");
            then.status(200).json_body(json!({ "portalId": 1 }));
        })
        .await;

    let state = common::test_state(
        common::test_db_offline(),
        ConnectorEndpoints {
            hubspot: Some(server.base_url()),
            ..Default::default()
        },
    );

    // Usage tracking fails against the offline database and is swallowed
    let info = state
        .integrations
        .test_connection(
            1,
            Platform::HubSpot,
            PlatformCredentials {
                access_token: "pat-test".to_string(),
                shop_domain: None,
                property_id: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(info, ConnectionInfo::HubSpot { portal_id: Some(1), .. }));
}

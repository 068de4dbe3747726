// Diesel table definitions. Created at startup by `SqliteAuditStore::init_schema`.

diesel::table! {
    chatbots (chatbot_id) {
        chatbot_id -> Text,
        organization_id -> Text,
    }
}

diesel::table! {
    subscriptions (organization_id) {
        organization_id -> Text,
        subscription_tier -> Text,
        compliance_trigger_count -> Integer,
        performance_trigger_count -> Integer,
    }
}

diesel::table! {
    compliance_records (chatbot_id, base_url) {
        chatbot_id -> Text,
        base_url -> Text,
        seo_score -> Nullable<Text>,
        passed_checks -> Integer,
        total_checks -> Integer,
        categories -> Text,
        action_items -> Text,
        configured_at -> Text,
        updated_at -> Nullable<Text>,
    }
}

diesel::table! {
    performance_records (chatbot_id, base_url) {
        chatbot_id -> Text,
        base_url -> Text,
        overall_score -> Nullable<Text>,
        metrics -> Nullable<Text>,
        accessibility -> Nullable<Text>,
        best_practices -> Nullable<Text>,
        seo -> Nullable<Text>,
        opportunities -> Text,
        diagnostics -> Text,
        recommendations -> Text,
        configured_at -> Text,
        updated_at -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    chatbots,
    subscriptions,
    compliance_records,
    performance_records,
);

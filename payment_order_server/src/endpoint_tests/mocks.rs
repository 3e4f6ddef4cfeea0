use gateway_client::{GatewayOrderResult, OrderCreateRequest};
use mockall::mock;
use payment_order_engine::{
    db_types::{EntitlementGrant, NewPaymentOrder, OrderId, OrderStatusType, PaymentOrder},
    traits::{
        EntitlementError,
        EntitlementHook,
        EntitlementStore,
        PaymentGateway,
        PaymentOrderStore,
        PaymentOrderStoreError,
    },
};

mock! {
    pub OrderStore {}
    impl Clone for OrderStore {
        fn clone(&self) -> Self;
    }
    impl PaymentOrderStore for OrderStore {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewPaymentOrder) -> Result<PaymentOrder, PaymentOrderStoreError>;
        async fn fetch_order(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;
        async fn fetch_order_by_ext_id(&self, ext_order_id: &str) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;
        async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;
        async fn record_gateway_acceptance<'a>(&self, id: &OrderId, gateway_order_id: Option<&'a str>, redirect_uri: &str) -> Result<PaymentOrder, PaymentOrderStoreError>;
        async fn mark_failed_if_pending(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;
        async fn compare_and_set_status<'a>(&self, id: &OrderId, expected: OrderStatusType, new_status: OrderStatusType, gateway_order_id: Option<&'a str>) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;
        async fn orders_for_buyer(&self, email: &str) -> Result<Vec<PaymentOrder>, PaymentOrderStoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_order(&self, order: &OrderCreateRequest) -> GatewayOrderResult;
    }
}

mock! {
    pub Hook {}
    impl EntitlementHook for Hook {
        async fn on_payment_completed(&self, order: &PaymentOrder) -> Result<(), EntitlementError>;
    }
}

mock! {
    pub GrantStore {}
    impl Clone for GrantStore {
        fn clone(&self) -> Self;
    }
    impl EntitlementStore for GrantStore {
        async fn record_grant(&self, order: &PaymentOrder) -> Result<bool, EntitlementError>;
        async fn latest_grant_for(&self, email: &str) -> Result<Option<EntitlementGrant>, EntitlementError>;
    }
}

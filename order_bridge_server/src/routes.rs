//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//!
//! Handlers must never block the worker thread. All I/O (database access, and the partner login behind the
//! automation driver) is expressed as futures.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_bridge_engine::{
    db_types::OrderId,
    events::listener_from_fn,
    AutomationDriver,
    BridgeDatabase,
    OrderManagement,
    OrdersApi,
    SessionManager,
};

use crate::{
    data_objects::{ConnectRequest, DisconnectRequest, IngestResponse, JsonResponse, StatusResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

route!(status => Get "/status" impl BridgeDatabase, AutomationDriver);
/// Reports whether a partner session is active, whether order events are being listened for, and how many orders
/// have been stored.
pub async fn status<B: BridgeDatabase, D: AutomationDriver>(
    manager: web::Data<SessionManager<B, D>>,
    orders: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET status");
    let state = manager.state().await?;
    let connected = manager.is_active().await?;
    let order_count = orders.count().await?;
    Ok(HttpResponse::Ok().json(StatusResponse::new(state, connected, manager.is_listening(), order_count)))
}

route!(orders => Get "/orders" impl OrderManagement);
/// All stored orders, most recently observed first.
pub async fn orders<B: OrderManagement>(api: web::Data<OrdersApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET orders");
    let orders = api.list_all().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    let order = api
        .order_by_external_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(connect => Post "/connect" impl BridgeDatabase, AutomationDriver);
/// Logs into the partner portal and starts listening for order events.
///
/// New orders are announced in the server log. A failed login returns 401 and leaves any existing session in place.
pub async fn connect<B: BridgeDatabase, D: AutomationDriver>(
    body: web::Json<ConnectRequest>,
    manager: web::Data<SessionManager<B, D>>,
) -> Result<HttpResponse, ServerError> {
    let ConnectRequest { username, password } = body.into_inner();
    debug!("💻️ POST connect for {username}");
    manager.connect(&username, &password).await?;
    manager.register_order_listener(listener_from_fn(|event| {
        let order = &event.order;
        info!(
            "💻️ New order {} for {} ({})",
            order.external_order_id,
            order.customer_name.as_deref().unwrap_or("unknown customer"),
            order.total_amount.map(|a| a.to_string()).unwrap_or_else(|| "no amount".into())
        );
        Ok(())
    }));
    manager.start_listening();
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{username} connected. Listening for orders."))))
}

route!(disconnect => Post "/disconnect" impl BridgeDatabase, AutomationDriver);
/// Stops listening for order events and deactivates the principal's session. The session record is kept.
pub async fn disconnect<B: BridgeDatabase, D: AutomationDriver>(
    body: web::Json<DisconnectRequest>,
    manager: web::Data<SessionManager<B, D>>,
) -> Result<HttpResponse, ServerError> {
    let DisconnectRequest { username } = body.into_inner();
    debug!("💻️ POST disconnect for {username}");
    manager.stop_listening();
    manager.disconnect(&username).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{username} disconnected"))))
}

route!(ingest => Post "/ingest" impl BridgeDatabase, AutomationDriver);
/// Accepts one raw order event payload from the automation driver.
///
/// Duplicates and unusable payloads are not errors. They are reported in the `outcome` field of a 200 response.
pub async fn ingest<B: BridgeDatabase, D: AutomationDriver>(
    body: String,
    manager: web::Data<SessionManager<B, D>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST ingest ({} bytes)", body.len());
    if !manager.is_listening() {
        debug!("💻️ Order event received while not listening. It will be ingested anyway.");
    }
    let outcome = manager.ingestion().ingest(Some(body.as_str())).await?;
    Ok(HttpResponse::Ok().json(IngestResponse::from(outcome)))
}

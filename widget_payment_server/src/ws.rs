//! The admin notification websocket.
//!
//! Each admin client that connects to `/ws` is greeted, registered with the [`NotificationHub`], and given one read
//! task. The read task only parses inbound frames and forwards them onto the hub's queue; all writes to clients after
//! the greeting are made by the hub's dispatcher. When the client goes away, the read task deregisters it.
use actix_web::{get, rt, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use widget_payment_engine::events::{
    AdminConnection,
    AdminEvent,
    AdminFrame,
    ConnectionClosed,
    EventProducer,
    NotificationHub,
    OutboundMessage,
};

pub type AdminHub = NotificationHub<WsConnection>;

/// The write half of an admin client's websocket.
#[derive(Clone)]
pub struct WsConnection(Session);

impl AdminConnection for WsConnection {
    async fn send_text(&mut self, text: &str) -> Result<(), ConnectionClosed> {
        self.0.text(text.to_string()).await.map_err(|_| ConnectionClosed("websocket session closed".into()))
    }

    async fn close(self) {
        // The session may already be closed from the other side; that's fine.
        let _ = self.0.close(None).await;
    }
}

#[get("/ws")]
pub async fn admin_socket(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<AdminHub>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let hub = hub.get_ref().clone();
    rt::spawn(serve_connection(session, stream, hub));
    Ok(response)
}

async fn serve_connection(mut session: Session, stream: MessageStream, hub: AdminHub) {
    let greeting = match serde_json::to_string(&OutboundMessage::greeting()) {
        Ok(g) => g,
        Err(e) => {
            error!("📢️ Could not serialize the greeting. {e}");
            return;
        },
    };
    if session.text(greeting).await.is_err() {
        debug!("📢️ Admin client left before it could be greeted");
        return;
    }
    let id = hub.register(WsConnection(session.clone())).await;
    read_frames(id, session, stream, hub.publisher()).await;
    if let Some(connection) = hub.deregister(id).await {
        connection.close().await;
    }
}

async fn read_frames(id: u64, mut session: Session, mut stream: MessageStream, publisher: EventProducer<AdminEvent>) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Some(event) = parse_frame(id, &text) {
                    publisher.try_publish_event(event);
                }
            },
            Ok(Message::Ping(bytes)) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            },
            Ok(Message::Close(reason)) => {
                debug!("📢️ Admin connection #{id} closed by the client. {reason:?}");
                break;
            },
            Ok(_) => {},
            Err(e) => {
                warn!("📢️ Admin connection #{id} sent a bad frame. {e}");
                break;
            },
        }
    }
}

/// Turns an inbound text frame into an event. Frames that are not JSON, or that name an unknown action, are logged
/// and dropped.
fn parse_frame(id: u64, text: &str) -> Option<AdminEvent> {
    let frame = serde_json::from_str::<AdminFrame>(text)
        .map_err(|e| warn!("📢️ Ignoring unreadable frame from admin connection #{id}. {e}"))
        .ok()?;
    AdminEvent::try_from(frame).map_err(|e| warn!("📢️ Ignoring frame from admin connection #{id}. {e}")).ok()
}

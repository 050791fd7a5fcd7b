use tokio::sync::mpsc;
use tracing::debug;

use crate::app::AppCommand;
use crate::gateway::{BackendGateway, GatewayResult};
use crate::store::WatchChange;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    Namespaces {
        result: GatewayResult<Vec<String>>,
        preferred: Option<String>,
    },
    Watched(GatewayResult<Vec<String>>),
    WatchToggled {
        namespace: String,
        change: WatchChange,
        result: GatewayResult<()>,
    },
    AlertChanged {
        action: &'static str,
        result: GatewayResult<()>,
    },
}

pub fn spawn_bootstrap(
    gateway: &BackendGateway,
    preferred: Option<String>,
    tx: &mpsc::UnboundedSender<BackendOutcome>,
) {
    let namespaces_gateway = gateway.clone();
    let namespaces_tx = tx.clone();
    tokio::spawn(async move {
        let result = namespaces_gateway.list_namespaces().await;
        deliver(&namespaces_tx, BackendOutcome::Namespaces { result, preferred });
    });

    let watched_gateway = gateway.clone();
    let watched_tx = tx.clone();
    tokio::spawn(async move {
        let result = watched_gateway.list_watched_namespaces().await;
        deliver(&watched_tx, BackendOutcome::Watched(result));
    });
}

pub fn spawn_command(
    gateway: &BackendGateway,
    command: AppCommand,
    tx: &mpsc::UnboundedSender<BackendOutcome>,
) {
    if command == AppCommand::None {
        return;
    }

    let gateway = gateway.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = match command {
            AppCommand::None => return,
            AppCommand::ToggleWatch { namespace, change } => {
                let result = change.send(&gateway, &namespace).await;
                BackendOutcome::WatchToggled {
                    namespace,
                    change,
                    result,
                }
            }
            AppCommand::CreateAlert(rule) => BackendOutcome::AlertChanged {
                action: "created",
                result: gateway.create_alert(&rule).await,
            },
            AppCommand::DeleteAlert { id } => BackendOutcome::AlertChanged {
                action: "deleted",
                result: gateway.delete_alert(id).await,
            },
        };
        deliver(&tx, outcome);
    });
}

fn deliver(tx: &mpsc::UnboundedSender<BackendOutcome>, outcome: BackendOutcome) {
    if tx.send(outcome).is_err() {
        debug!("backend outcome dropped, event loop is gone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::config::Settings;
    use crate::input::Action;
    use crate::locale::{Locale, Messages};
    use crate::view::FetchRequest;
    use mockito::Server;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::error::TryRecvError;

    fn app() -> App {
        App::new(&Settings::default(), Messages::load(Locale::En).unwrap())
    }

    async fn silent_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        url
    }

    #[tokio::test]
    async fn pending_watch_toggle_leaves_keys_responsive() {
        let url = silent_backend().await;
        let gateway = BackendGateway::new(&url, Duration::from_millis(300)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();

        let command = app.apply_action(Action::ToggleWatch);
        spawn_command(&gateway, command, &tx);

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        app.apply_action(Action::SwitchPage(2));
        assert_eq!(
            app.fetch_plan().unwrap().request,
            FetchRequest::Pods {
                namespace: "default".to_string()
            }
        );
        app.apply_action(Action::Quit);
        assert!(!app.running());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        let outcome = rx.recv().await.unwrap();
        app.apply_outcome(outcome);
        assert!(!app.session().watched.contains("default"));
        assert_eq!(app.status(), "Watch toggle failed: backend request timed out");
    }

    #[tokio::test]
    async fn bootstrap_runs_off_the_event_loop() {
        let url = silent_backend().await;
        let gateway = BackendGateway::new(&url, Duration::from_millis(300)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();

        spawn_bootstrap(&gateway, None, &tx);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(app.fetch_plan().unwrap().request, FetchRequest::Nodes);

        for _ in 0..2 {
            let outcome = rx.recv().await.unwrap();
            app.apply_outcome(outcome);
        }
        assert!(app.session().namespaces.namespaces().is_empty());
        assert!(app.session().watched.namespaces().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_delivers_namespaces_and_watched_set() {
        let mut server = Server::new_async().await;
        let _namespaces = server
            .mock("GET", "/api/namespaces")
            .with_status(200)
            .with_body(r#"["default","prod"]"#)
            .create_async()
            .await;
        let _watched = server
            .mock("GET", "/api/watched_namespaces")
            .with_status(200)
            .with_body(r#"{"namespaces":["prod"]}"#)
            .create_async()
            .await;
        let gateway = BackendGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();

        spawn_bootstrap(&gateway, Some("prod".to_string()), &tx);
        for _ in 0..2 {
            let outcome = rx.recv().await.unwrap();
            app.apply_outcome(outcome);
        }

        assert_eq!(app.session().namespaces.selected(), "prod");
        assert!(app.session().watched.contains("prod"));
    }

    #[tokio::test]
    async fn alert_delete_reports_outcome() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/api/alerts/9")
            .with_status(200)
            .create_async()
            .await;
        let gateway = BackendGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_command(&gateway, AppCommand::DeleteAlert { id: 9 }, &tx);
        assert_eq!(
            rx.recv().await.unwrap(),
            BackendOutcome::AlertChanged {
                action: "deleted",
                result: Ok(()),
            }
        );
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn no_command_spawns_nothing() {
        let gateway = BackendGateway::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_command(&gateway, AppCommand::None, &tx);
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}

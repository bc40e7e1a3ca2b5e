use super::*;

use std::cell::Cell;

fn text_server() -> EphemeralJobServer<impl RequestHandler> {
    let handler = |method: &Method, path: &str| {
        if method == Method::GET && path == "/abc.txt" {
            HttpResponse::ok("text/plain", "abc")
        } else {
            HttpResponse::not_found(path)
        }
    };
    EphemeralJobServer::new(handler, 20000..=60000).unwrap()
}

fn get(port: u16, path: &str) -> reqwest::blocking::Response {
    reqwest::blocking::get(format!("http://127.0.0.1:{port}{path}")).unwrap()
}

#[test]
fn serves_fixed_content_while_job_runs() {
    let body = text_server()
        .run(|port| {
            let resp = get(port, "/abc.txt");
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
            assert_eq!(
                resp.headers()[reqwest::header::CONTENT_TYPE],
                "text/plain"
            );
            Ok(resp.text().unwrap())
        })
        .unwrap();
    assert_eq!(body, "abc");
}

#[test]
fn repeated_requests_get_the_same_answer() {
    text_server()
        .run(|port| {
            let client = reqwest::blocking::Client::new();
            for _ in 0..5 {
                let text = client
                    .get(format!("http://127.0.0.1:{port}/abc.txt"))
                    .send()
                    .unwrap()
                    .text()
                    .unwrap();
                assert_eq!(text, "abc");
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn unknown_paths_are_404_plain_text() {
    text_server()
        .run(|port| {
            let resp = get(port, "/nope");
            assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
            assert!(resp.text().unwrap().contains("/nope"));
            Ok(())
        })
        .unwrap();
}

#[test]
fn port_collisions_are_retried_with_another_port() {
    let occupied = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let busy = occupied.local_addr().unwrap().port();

    let picks = Cell::new(0);
    let pick = || {
        picks.set(picks.get() + 1);
        if picks.get() <= 2 { busy } else { 0 }
    };
    let port = text_server()
        .run_with_picker(pick, |port| {
            assert_eq!(get(port, "/abc.txt").text().unwrap(), "abc");
            Ok(port)
        })
        .unwrap();
    assert_ne!(port, busy);
    assert_eq!(picks.get(), 3);
    drop(occupied);
}

#[test]
fn job_error_is_returned_after_shutdown() {
    let mut seen = 0;
    let err = text_server()
        .run(|port| -> ReelResult<()> {
            seen = port;
            Err(ReelError::encode("encoder exploded"))
        })
        .unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(std::net::TcpStream::connect((Ipv4Addr::LOCALHOST, seen)).is_err());
}

#[test]
fn job_panic_is_resumed_on_the_caller() {
    let server = text_server();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        server.run(|_| -> ReelResult<()> { panic!("job blew up") })
    }));
    let panic = result.unwrap_err();
    assert_eq!(panic.downcast_ref::<&str>(), Some(&"job blew up"));
}

#[test]
fn port_range_is_validated() {
    let h = |_: &Method, p: &str| HttpResponse::not_found(p);
    assert!(matches!(
        EphemeralJobServer::new(h, 0..=10),
        Err(ReelError::Config(_))
    ));
    assert!(matches!(
        EphemeralJobServer::new(h, 5000..=4000),
        Err(ReelError::Config(_))
    ));
    assert!(EphemeralJobServer::new(h, 5000..=5000).is_ok());
}

//! Integration tests for HTTPS over the blocking-socket backend
//!
//! The server side uses a self-signed certificate generated per test run.

#![cfg(feature = "tls")]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use http10::http::tls::{TlsConfig, TlsError};
use http10::http::{Client, ClientConfig, Error, Headers};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{ErrorCode, SslAcceptor, SslMethod};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509NameBuilder, X509};

fn self_signed_cert() -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

fn acceptor(cert: &X509, key: &PKey<Private>) -> SslAcceptor {
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    builder.set_certificate(cert).unwrap();
    builder.set_private_key(key).unwrap();
    builder.check_private_key().unwrap();
    builder.build()
}

/// Serve one HTTPS request and return what the client sent
fn serve_tls_once(acceptor: SslAcceptor, response: &'static [u8]) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut tls = acceptor.accept(stream).unwrap();

        let mut data = Vec::new();
        let mut buf = [0u8; 256];
        while !data.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = tls.read(&mut buf).unwrap();
            assert!(n > 0);
            data.extend_from_slice(&buf[..n]);
        }

        tls.write_all(response).unwrap();
        let _ = tls.shutdown();
        String::from_utf8(data).unwrap()
    });

    (port, handle)
}

#[test]
fn test_https_get_without_verification() {
    let (cert, key) = self_signed_cert();
    let (port, server) = serve_tls_once(
        acceptor(&cert, &key),
        b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nsecret",
    );

    let tls = TlsConfig::client().verify_peer(false).build().unwrap();
    let config = ClientConfig::default()
        .with_tls(tls)
        .with_write_buf_size(8);
    let client = Client::with_config("https", "127.0.0.1", Some(port), config).unwrap();

    let response = client.get("/secure", &Headers::new()).unwrap();
    assert_eq!(response.code(), Some(200));
    assert_eq!(response.content_type(), Some("text/plain"));
    assert_eq!(response.body(), Some("secret"));

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /secure HTTP/1.0\r\n"));
}

#[test]
fn test_https_get_with_trusted_ca_file() {
    let (cert, key) = self_signed_cert();
    let dir = tempfile::tempdir().unwrap();
    let ca_path = dir.path().join("ca.pem");
    std::fs::write(&ca_path, cert.to_pem().unwrap()).unwrap();

    let (port, server) = serve_tls_once(acceptor(&cert, &key), b"HTTP/1.0 200 OK\r\n\r\ntrusted");

    let tls = TlsConfig::client().ca_file(&ca_path).build().unwrap();
    let config = ClientConfig::default().with_tls(tls);
    let client = Client::with_config("https", "127.0.0.1", Some(port), config).unwrap();

    let response = client.get("/", &Headers::new()).unwrap();
    assert_eq!(response.body(), Some("trusted"));

    server.join().unwrap();
}

#[test]
fn test_https_untrusted_certificate_fails_handshake() {
    let (cert, key) = self_signed_cert();
    let acceptor = acceptor(&cert, &key);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        // the client aborts the handshake
        let _ = acceptor.accept(stream);
    });

    let client = Client::new("https", "127.0.0.1", Some(port)).unwrap();
    let err = match client.get("/", &Headers::new()) {
        Err(Error::Tls(err)) => err,
        other => panic!("expected a TLS error, got {:?}", other.map(|r| r.code())),
    };

    // the openssl error is kept, not flattened into text
    match &err {
        TlsError::HandshakeFailed(ssl_err) => assert_eq!(ssl_err.code(), ErrorCode::SSL),
        other => panic!("expected a handshake failure, got {:?}", other),
    }
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.io_error().is_none());

    server.join().unwrap();
}

#[test]
fn test_https_peer_hangup_fails_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        // accept and hang up without speaking TLS
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let tls = TlsConfig::client().verify_peer(false).build().unwrap();
    let config = ClientConfig::default().with_tls(tls);
    let client = Client::with_config("https", "127.0.0.1", Some(port), config).unwrap();

    let result = client.get("/", &Headers::new());
    match result {
        Err(Error::Tls(err @ TlsError::HandshakeFailed(_))) => {
            assert!(std::error::Error::source(&err).is_some());
        }
        other => panic!("expected a handshake failure, got {:?}", other.map(|r| r.code())),
    }

    server.join().unwrap();
}

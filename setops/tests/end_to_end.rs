//! Both parties over TCP on the loopback interface, one per thread.

use setops::{ErrorKind, NetParams, Pjc, Psi, PsiScheme, SessionConfig};

fn config(party_id: u8, base_port: u16) -> SessionConfig {
    let mut cfg = SessionConfig::new(
        party_id,
        NetParams {
            remote_addr: "127.0.0.1".into(),
            remote_port: base_port + (1 - party_id as u16),
            local_port: base_port + party_id as u16,
            timeout_secs: 20,
        },
    );
    cfg.threads = Some(2);
    cfg
}

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|x| x.to_string()).collect()
}

fn psi_over_tcp(scheme: PsiScheme, base_port: u16) {
    let mut cfg0 = config(0, base_port);
    let mut cfg1 = config(1, base_port);
    cfg0.psi_scheme = scheme;
    cfg1.psi_scheme = scheme;
    let handle = std::thread::spawn(move || {
        Psi::new(cfg1)
            .unwrap()
            .process(&strings(&["b", "c", "d", "e"]), true, false)
    });
    let r0 = Psi::new(cfg0)
        .unwrap()
        .process(&strings(&["a", "b", "c", "e"]), true, true)
        .unwrap();
    let r1 = handle.join().unwrap().unwrap();
    assert_eq!(r0, strings(&["b", "c", "e"]));
    assert_eq!(r1, strings(&["b", "c", "e"]));
}

#[test]
fn test_ecdh_psi_over_tcp() {
    psi_over_tcp(PsiScheme::Ecdh, 47501);
}

#[test]
fn test_kkrt_psi_over_tcp() {
    psi_over_tcp(PsiScheme::Kkrt, 47511);
}

#[test]
fn test_cardinality_over_tcp() {
    let cfg0 = config(0, 47521);
    let cfg1 = config(1, 47521);
    let handle = std::thread::spawn(move || {
        Psi::new(cfg1)
            .unwrap()
            .process_cardinality_only(&strings(&["2", "3", "9"]), false, false)
    });
    let n = Psi::new(cfg0)
        .unwrap()
        .process_cardinality_only(&strings(&["1", "2", "3"]), true, false)
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn test_pjc_over_tcp() {
    let cfg0 = config(0, 47531);
    let cfg1 = config(1, 47531);
    let handle = std::thread::spawn(move || {
        Pjc::new(cfg1)
            .unwrap()
            .process(&strings(&["2", "3", "4"]), &[vec![5, 7, 9]], false)
    });
    let s0 = Pjc::new(cfg0)
        .unwrap()
        .process(&strings(&["1", "2", "3"]), &[vec![1, 2, 3]], false)
        .unwrap();
    let s1 = handle.join().unwrap().unwrap();
    let out = s0.reconstruct(&s1).unwrap();
    assert_eq!(
        out.to_rows(),
        vec![vec![0, 0, 0], vec![1, 2, 5], vec![1, 3, 7]]
    );
}

#[test]
fn test_peer_gone_is_a_transport_error() {
    let mut cfg = config(0, 47541);
    cfg.net_params.timeout_secs = 1;
    let err = Psi::new(cfg)
        .unwrap()
        .process(&strings(&["a"]), true, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

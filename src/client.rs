//! High-level TL1 client: named operations over a [`Session`].
//!
//! Each operation renders its parameters through the allow-lists in this
//! module, formats the fixed command template, executes it, and parses the
//! response with the shape declared for that operation. Orchestration only;
//! the grammar and transport rules live in [`crate::grammar`] and
//! [`crate::session`].

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::encode::{self, Params};
use crate::grammar;
use crate::response::{OperationResult, QueryResult};
use crate::session::{Session, SessionError};

// ---------------------------------------------------------------------------
// Parameter allow-lists (FiberHome EMS command set)
// ---------------------------------------------------------------------------

const LST_OMDDM_TARGET: &[&str] = &[
    "ONUIP", "OLTID", "PONID", "ONUIDTYPE", "ONUID", "PORTID", "PEERFLAG",
];

const LST_UNREGONU_TARGET: &[&str] = &["OLTID", "PONID"];

const ADD_ONU_TARGET: &[&str] = &["OLTID", "PONID"];
const ADD_ONU_DATABLOCK: &[&str] = &[
    "AUTHTYPE", "ONUID", "PWD", "ONUNO", "NAME", "DESC", "ONUTYPE",
];

const DEL_ONU_TARGET: &[&str] = &["OLTID", "PONID"];
const DEL_ONU_DATABLOCK: &[&str] = &["ONUIDTYPE", "ONUID"];

const CFG_WAN_TARGET: &[&str] = &["ONUIP", "OLTID", "PONID", "ONUIDTYPE", "ONUID"];
const CFG_WAN_DATABLOCK: &[&str] = &[
    "STATUS", "MODE", "CONNTYPE", "VLAN", "COS", "QOS", "NAT", "IPMODE", "WANIP",
    "WANMASK", "WANGATEWAY", "MASTERDNS", "SLAVEDNS", "PPPOEPROXY", "PPPOEUSER",
    "PPPOEPASSWD", "PPPOENAME", "PPPOEMODE", "UPORT", "SSID", "WANSVC",
    "UPPROFILENAME", "DOWNPROFILENAME",
];

const CFG_LAN_TARGET: &[&str] = &[
    "ONUIP", "OLTID", "PONID", "ONUIDTYPE", "ONUID", "ONUPORT",
];
const CFG_LAN_DATABLOCK: &[&str] = &["BW", "VLANMOD", "PVID", "PCOS"];

/// Raw response text paired with its parsed record.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub raw: String,
    pub parsed: T,
}

/// TL1 client for FiberHome OLTs.
///
/// # Example
///
/// ```no_run
/// use lightpath::client::Tl1Client;
/// use lightpath::encode::Params;
/// use lightpath::session::DEFAULT_PORT;
///
/// let mut client = Tl1Client::connect(("10.0.0.1", DEFAULT_PORT))?;
/// client.login("admin", "admin", None)?;
///
/// let params = Params::from([("OLTID", "10.0.0.1"), ("PONID", "1-1-1-1")]);
/// let unregistered = client.lst_unregistered_onu(&params, None)?;
/// for onu in &unregistered.parsed.values {
///     println!("{onu:?}");
/// }
///
/// client.logout(None)?;
/// client.end();
/// # Ok::<(), lightpath::SessionError>(())
/// ```
pub struct Tl1Client {
    session: Session,
}

impl Tl1Client {
    /// Connect to the OLT's TL1 agent.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, SessionError> {
        Ok(Self {
            session: Session::connect(addr)?,
        })
    }

    /// Connect with an explicit TCP connect timeout.
    pub fn connect_timeout(addr: &SocketAddr, timeout: Duration) -> Result<Self, SessionError> {
        Ok(Self {
            session: Session::connect_timeout(addr, timeout)?,
        })
    }

    /// The underlying session, for timeout and callback configuration.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Execute a raw, caller-assembled command and return the response text.
    pub fn execute(&mut self, cmd: &str) -> Result<String, SessionError> {
        let raw = self.session.execute(cmd)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Close the session. Later calls fail with [`SessionError::Closed`].
    pub fn end(&mut self) {
        self.session.end();
    }

    // -----------------------------------------------------------------------
    // Session-level operations
    // -----------------------------------------------------------------------

    /// `LOGIN` — authenticate against the EMS.
    pub fn login(
        &mut self,
        user: &str,
        passwd: &str,
        ctag: Option<&str>,
    ) -> Result<Response<OperationResult>, SessionError> {
        let ctag = ctag.unwrap_or("LGN");
        let params = format!("UN={user},PWD={passwd}");
        let cmd = encode::session_command("LOGIN", ctag, &params);
        self.operation(&cmd)
    }

    /// `LOGOUT` — end the EMS session (the TCP session stays open).
    pub fn logout(&mut self, ctag: Option<&str>) -> Result<Response<OperationResult>, SessionError> {
        let cmd = encode::session_command("LOGOUT", ctag.unwrap_or("LGT"), "");
        self.operation(&cmd)
    }

    /// `SHAKEHAND` — keepalive; EMS sessions idle out without it.
    pub fn handshake(&mut self, ctag: Option<&str>) -> Result<Response<OperationResult>, SessionError> {
        let cmd = encode::session_command("SHAKEHAND", ctag.unwrap_or("HNDSHK"), "");
        self.operation(&cmd)
    }

    // -----------------------------------------------------------------------
    // Query operations
    // -----------------------------------------------------------------------

    /// `LST-OMDDM` — optical module DDM readings (power, bias, temperature).
    pub fn lst_optical_module_ddm(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<QueryResult>, SessionError> {
        let target = encode::format_params(LST_OMDDM_TARGET, params);
        let cmd = encode::target_command("LST-OMDDM", &target, ctag.unwrap_or("LSTD"), "");
        self.query(&cmd)
    }

    /// `LST-UNREGONU` — ONUs discovered on a PON but not yet authorized.
    pub fn lst_unregistered_onu(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<QueryResult>, SessionError> {
        let target = encode::format_params(LST_UNREGONU_TARGET, params);
        let cmd = encode::target_command("LST-UNREGONU", &target, ctag.unwrap_or("LSTUN"), "");
        self.query(&cmd)
    }

    // -----------------------------------------------------------------------
    // Provisioning operations
    // -----------------------------------------------------------------------

    /// `ADD-ONU` — authorize an ONU on a PON port.
    pub fn add_onu(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<OperationResult>, SessionError> {
        let target = encode::format_params(ADD_ONU_TARGET, params);
        let datablock = encode::format_params(ADD_ONU_DATABLOCK, params);
        let cmd = encode::target_command("ADD-ONU", &target, ctag.unwrap_or("ADDONU"), &datablock);
        self.operation(&cmd)
    }

    /// `DEL-ONU` — deauthorize an ONU.
    pub fn delete_onu(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<OperationResult>, SessionError> {
        let target = encode::format_params(DEL_ONU_TARGET, params);
        let datablock = encode::format_params(DEL_ONU_DATABLOCK, params);
        let cmd = encode::target_command("DEL-ONU", &target, ctag.unwrap_or("DELONU"), &datablock);
        self.operation(&cmd)
    }

    /// `SET-WANSERVICE` — configure a WAN connection on an ONU.
    pub fn configure_wan_connection(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<OperationResult>, SessionError> {
        let target = encode::format_params(CFG_WAN_TARGET, params);
        let datablock = encode::format_params(CFG_WAN_DATABLOCK, params);
        let cmd =
            encode::target_command("SET-WANSERVICE", &target, ctag.unwrap_or("CFGWAN"), &datablock);
        self.operation(&cmd)
    }

    /// `CFG-LANPORT` — configure an ONU LAN port.
    pub fn configure_lan_port(
        &mut self,
        params: &Params<'_>,
        ctag: Option<&str>,
    ) -> Result<Response<OperationResult>, SessionError> {
        let target = encode::format_params(CFG_LAN_TARGET, params);
        let datablock = encode::format_params(CFG_LAN_DATABLOCK, params);
        let cmd =
            encode::target_command("CFG-LANPORT", &target, ctag.unwrap_or("CFGLAN"), &datablock);
        self.operation(&cmd)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn operation(&mut self, cmd: &str) -> Result<Response<OperationResult>, SessionError> {
        let raw = self.execute(cmd)?;
        let parsed = grammar::parse_operation(&raw)?;
        Ok(Response { raw, parsed })
    }

    /// Execute a query command. If the response fails the query grammar but
    /// parses as an operation result, the remote rejected the query; the
    /// re-parsed record is surfaced as [`SessionError::Denied`] so callers
    /// get the error-code/description pair instead of a grammar mismatch.
    fn query(&mut self, cmd: &str) -> Result<Response<QueryResult>, SessionError> {
        let raw = self.execute(cmd)?;
        match grammar::parse_query(&raw) {
            Ok(parsed) => Ok(Response { raw, parsed }),
            Err(query_err) => match grammar::parse_operation(&raw) {
                Ok(op) => Err(SessionError::Denied(op)),
                Err(_) => Err(query_err.into()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::CompletionCode;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const OPERATION_OK: &str = concat!(
        "\r\n",
        "   HOST1 2024-01-02 03:04:05\r\n",
        "M  LGN COMPLD\r\n",
        "   EN=0   ENDESC=no error\r\n",
        ";",
    );

    const QUERY_OK: &str = concat!(
        "\r\n",
        "   HOST1 2024-01-02 03:04:05\r\n",
        "M  LSTUN COMPLD\r\n",
        "   total_blocks=1\r\n",
        "   block_number=1\r\n",
        "   block_records=1\r\n",
        "\r\n",
        "List of unregistered ONUs\r\n",
        "---------------------------\r\n",
        "ONUID\tMAC\r\n",
        "1\tFHTT01020304\r\n",
        "---------------------------\r\n",
        ";",
    );

    const QUERY_DENIED: &str = concat!(
        "\r\n",
        "   HOST1 2024-01-02 03:04:05\r\n",
        "M  LSTUN DENY\r\n",
        "   EN=DDB   ENDESC=device is busy\r\n",
        ";",
    );

    /// One scripted exchange: assert the received command, send the canned
    /// response, hand back the client for further use.
    fn serve_one(response: &'static str) -> (SocketAddr, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (addr, handle)
    }

    #[test]
    fn login_formats_command_and_parses_operation() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let resp = client.login("admin", "secret", None).unwrap();
        assert_eq!(peer.join().unwrap(), "LOGIN:::LGN::UN=admin,PWD=secret;");
        assert_eq!(resp.parsed.header.ctag, "LGN");
        assert_eq!(resp.parsed.header.completion_code, CompletionCode::Compld);
        assert_eq!(resp.raw, OPERATION_OK);
    }

    #[test]
    fn logout_and_handshake_templates() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        client.logout(Some("BYE")).unwrap();
        assert_eq!(peer.join().unwrap(), "LOGOUT:::BYE::;");

        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        client.handshake(None).unwrap();
        assert_eq!(peer.join().unwrap(), "SHAKEHAND:::HNDSHK::;");
    }

    #[test]
    fn add_onu_builds_target_and_datablock() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([
            ("OLTID", "10.0.0.1"),
            ("PONID", "1-1-1-1"),
            ("AUTHTYPE", "MAC"),
            ("ONUID", "FHTT01020304"),
            ("ONUTYPE", "AN5506-04"),
        ]);
        client.add_onu(&params, None).unwrap();
        assert_eq!(
            peer.join().unwrap(),
            "ADD-ONU::OLTID=10.0.0.1,PONID=1-1-1-1:ADDONU::\
             AUTHTYPE=MAC,ONUID=FHTT01020304,ONUTYPE=AN5506-04;",
        );
    }

    #[test]
    fn delete_onu_command_shape() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([
            ("OLTID", "10.0.0.1"),
            ("PONID", "1-1-1-1"),
            ("ONUIDTYPE", "MAC"),
            ("ONUID", "FHTT01020304"),
        ]);
        client.delete_onu(&params, Some("RM1")).unwrap();
        assert_eq!(
            peer.join().unwrap(),
            "DEL-ONU::OLTID=10.0.0.1,PONID=1-1-1-1:RM1::ONUIDTYPE=MAC,ONUID=FHTT01020304;",
        );
    }

    #[test]
    fn query_parses_tabular_body() {
        let (addr, peer) = serve_one(QUERY_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([("OLTID", "10.0.0.1"), ("PONID", "1-1-1-1")]);
        let resp = client.lst_unregistered_onu(&params, None).unwrap();
        assert_eq!(
            peer.join().unwrap(),
            "LST-UNREGONU::OLTID=10.0.0.1,PONID=1-1-1-1:LSTUN::;",
        );
        assert_eq!(resp.parsed.attribs, vec!["ONUID", "MAC"]);
        assert_eq!(resp.parsed.values[0]["MAC"], "FHTT01020304");
    }

    #[test]
    fn denied_query_surfaces_operation_record() {
        let (addr, peer) = serve_one(QUERY_DENIED);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([("OLTID", "10.0.0.1")]);
        match client.lst_optical_module_ddm(&params, None) {
            Err(SessionError::Denied(op)) => {
                assert_eq!(op.header.completion_code, CompletionCode::Deny);
                assert_eq!(op.error_code, "DDB");
                assert_eq!(op.error_description, "device is busy");
            }
            other => panic!("expected Denied, got {other:?}"),
        }
        peer.join().unwrap();
    }

    #[test]
    fn garbage_query_response_keeps_grammar_error() {
        let (addr, peer) = serve_one("not a tl1 response at all");
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::new();
        assert!(matches!(
            client.lst_unregistered_onu(&params, None),
            Err(SessionError::Parse(_)),
        ));
        peer.join().unwrap();
    }

    #[test]
    fn wan_lan_configuration_command_shape() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([
            ("OLTID", "10.0.0.1"),
            ("PONID", "1-1-1-1"),
            ("ONUIDTYPE", "MAC"),
            ("ONUID", "FHTT01020304"),
            ("VLAN", "100"),
            ("MODE", "2"),
            ("STATUS", "1"),
        ]);
        client.configure_wan_connection(&params, None).unwrap();
        assert_eq!(
            peer.join().unwrap(),
            "SET-WANSERVICE::OLTID=10.0.0.1,PONID=1-1-1-1,ONUIDTYPE=MAC,ONUID=FHTT01020304:\
             CFGWAN::STATUS=1,MODE=2,VLAN=100;",
        );

        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let params = Params::from([
            ("OLTID", "10.0.0.1"),
            ("PONID", "1-1-1-1"),
            ("ONUID", "FHTT01020304"),
            ("ONUPORT", "1"),
            ("PVID", "100"),
        ]);
        client.configure_lan_port(&params, None).unwrap();
        assert_eq!(
            peer.join().unwrap(),
            "CFG-LANPORT::OLTID=10.0.0.1,PONID=1-1-1-1,ONUID=FHTT01020304,ONUPORT=1:\
             CFGLAN::PVID=100;",
        );
    }

    #[test]
    fn raw_execute_passthrough() {
        let (addr, peer) = serve_one(OPERATION_OK);
        let mut client = Tl1Client::connect(addr).unwrap();
        let raw = client.execute("LST-ONU::OLTID=1:X::;").unwrap();
        assert_eq!(raw, OPERATION_OK);
        assert_eq!(peer.join().unwrap(), "LST-ONU::OLTID=1:X::;");
    }
}

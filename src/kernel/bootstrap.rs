//! Driver loop run by the default interpreter command (`python3 -u -c …`).
//!
//! Reads one JSON request per stdin line, executes its code in a single
//! persistent global namespace with stdout captured, and answers with one
//! JSON reply per line. The real stdout is reserved for the protocol.

/// Python source of the NDJSON driver loop.
pub const BOOTSTRAP_SOURCE: &str = r#"
import contextlib, io, json, sys, traceback

_proto_out = sys.stdout
_namespace = {"__name__": "__main__"}

def _proto_send(message):
    _proto_out.write(json.dumps(message) + "\n")
    _proto_out.flush()

_proto_send({"ready": True})

for _raw in sys.stdin:
    _raw = _raw.strip()
    if not _raw:
        continue
    _request = json.loads(_raw)
    _captured = io.StringIO()
    try:
        with contextlib.redirect_stdout(_captured):
            exec(compile(_request["code"], "<inliner-session>", "exec"), _namespace)
    except BaseException:
        _proto_send({
            "id": _request["id"],
            "status": "error",
            "traceback": traceback.format_exc().splitlines(),
        })
    else:
        _proto_send({
            "id": _request["id"],
            "status": "ok",
            "output": _captured.getvalue() if _request.get("capture") else "",
        })
"#;

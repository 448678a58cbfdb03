//! Built-in signing page.

pub(crate) const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sign scene deployment</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; }
  code { word-break: break-all; }
  button { font-size: 1rem; padding: .5rem 1.5rem; }
  #status { margin-top: 1rem; }
</style>
</head>
<body>
<h1>Sign scene deployment</h1>
<dl>
  <dt>Entity</dt><dd><code id="entity">loading…</code></dd>
  <dt>Pointers</dt><dd id="pointers"></dd>
  <dt>Network</dt><dd id="network"></dd>
  <dt>Target</dt><dd id="target"></dd>
</dl>
<button id="sign" disabled>Sign with wallet</button>
<p id="status"></p>
<script>
const status = (msg) => { document.getElementById("status").textContent = msg; };

async function post(body) {
  const res = await fetch("/api/sign", {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify(body),
  });
  if (!res.ok) {
    const err = await res.json().catch(() => ({ error: { message: res.statusText } }));
    throw new Error(err.error.message);
  }
}

async function main() {
  const payload = await (await fetch("/api/payload")).json();
  document.getElementById("entity").textContent = payload.entityId;
  document.getElementById("pointers").textContent = payload.pointers.join(" ");
  document.getElementById("network").textContent = payload.network;
  document.getElementById("target").textContent = payload.target;

  const button = document.getElementById("sign");
  if (!window.ethereum) {
    status("No wallet found in this browser.");
    return;
  }
  button.disabled = false;
  button.onclick = async () => {
    button.disabled = true;
    try {
      const [address] = await window.ethereum.request({ method: "eth_requestAccounts" });
      const chainId = parseInt(await window.ethereum.request({ method: "eth_chainId" }), 16);
      let signature;
      try {
        signature = await window.ethereum.request({
          method: "personal_sign",
          params: [payload.message, address],
        });
      } catch (e) {
        await post({ error: e.message || "signature rejected" });
        status("Signature rejected. You can close this tab.");
        return;
      }
      await post({ address, signature, chainId });
      status("Signed. You can close this tab.");
    } catch (e) {
      status("Error: " + e.message);
      button.disabled = false;
    }
  };
}

main().catch((e) => status("Error: " + e.message));
</script>
</body>
</html>
"#;

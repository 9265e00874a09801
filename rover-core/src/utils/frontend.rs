//! Operator control page served at `/`.
//!
//! Arrow buttons set the joystick axes; while any button is held the page
//! streams `"x,y"` over the `drive` WebSocket every 70 ms and falls back to
//! polling `/joy` every 100 ms when the socket is down. Releasing everything
//! sends one final `0,0`.

pub const HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Rover</title>
<meta name="viewport" content="width=device-width, initial-scale=1, user-scalable=no">
<style>
* { box-sizing: border-box; margin: 0; padding: 0; user-select: none; -webkit-user-select: none; -webkit-touch-callout: none; }
body { height: 100vh; background: #1a2933; color: #e0e0e0; font-family: sans-serif; display: flex; flex-direction: column; align-items: center; overflow: hidden; }
#status { width: 100%; padding: 10px; text-align: center; background: #111; color: #00bfff; font-weight: bold; }
#pad { display: flex; justify-content: space-between; align-items: center; width: 90%; flex-grow: 1; }
.group { display: flex; gap: 10px; }
.col { flex-direction: column; }
.btn { width: 100px; height: 100px; font-size: 3em; background: #283a47; border: 3px solid #00bfff; border-radius: 15px; color: #00bfff; display: flex; justify-content: center; align-items: center; touch-action: none; }
.btn.active { background: #00bfff; color: #fff; }
</style>
</head>
<body>
<div id="status">Disconnected</div>
<div id="pad">
  <div class="group"><div class="btn" id="left">&#9664;</div><div class="btn" id="right">&#9654;</div></div>
  <div class="group col"><div class="btn" id="up">&#9650;</div><div class="btn" id="down">&#9660;</div></div>
</div>
<script>
const status = document.getElementById('status');
let x = 0, y = 0, timer = null, ws = null;

function connect() {
  ws = new WebSocket('ws://' + location.host + '/ws', ['drive']);
  ws.onopen = () => { status.innerText = 'Connected'; };
  ws.onclose = () => { status.innerText = 'Polling'; setTimeout(connect, 1000); };
}

function send() {
  if (ws && ws.readyState === WebSocket.OPEN) {
    ws.send(x + ',' + y);
  } else {
    fetch('/joy?x=' + x + '&y=' + y).catch(() => {});
  }
}

function update() {
  if (x === 0 && y === 0) {
    clearInterval(timer);
    timer = null;
    send();
  } else if (!timer) {
    send();
    const live = ws && ws.readyState === WebSocket.OPEN;
    timer = setInterval(send, live ? 70 : 100);
  }
}

function bind(id, axis, value) {
  const el = document.getElementById(id);
  const press = (e) => { e.preventDefault(); el.classList.add('active'); if (axis === 'x') x = value; else y = value; update(); };
  const release = (e) => { e.preventDefault(); el.classList.remove('active'); if (axis === 'x') x = 0; else y = 0; update(); };
  el.addEventListener('mousedown', press);
  el.addEventListener('touchstart', press);
  el.addEventListener('mouseup', release);
  el.addEventListener('mouseleave', release);
  el.addEventListener('touchend', release);
}

bind('left', 'x', -1);
bind('right', 'x', 1);
bind('up', 'y', 1);
bind('down', 'y', -1);

document.body.addEventListener('touchend', (e) => {
  if (!e.target.classList.contains('btn')) {
    x = 0; y = 0;
    document.querySelectorAll('.btn').forEach(b => b.classList.remove('active'));
    update();
  }
});

connect();
</script>
</body>
</html>
"#;

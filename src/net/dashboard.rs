//! Static dashboard served at `/` and `/index.html`.
//!
//! Polls `/json` every two seconds, plots the last readings against the
//! limits from `/config`, and posts the settings form to `/cfg`.

pub const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Weather Station</title>
<style>
body{font-family:sans-serif;margin:0;padding:1em;background:#111;color:#eee}
h1{font-size:1.3em}
.card{background:#222;border-radius:8px;padding:.8em;margin:.6em 0}
canvas{width:100%;height:120px;background:#181818}
label{display:inline-block;width:8em}
input{width:6em;margin:.15em}
#msg{min-height:1.2em}
</style>
</head>
<body>
<h1>Weather Station</h1>
<div class="card" id="now">Waiting for data...</div>
<div class="card"><canvas id="g-temp_aht20"></canvas></div>
<div class="card"><canvas id="g-hum_aht20"></canvas></div>
<div class="card"><canvas id="g-press_bmp280"></canvas></div>
<form class="card" id="cfg">
<div><label>Temp min/max</label><input name="temp_min"><input name="temp_max"></div>
<div><label>Hum min/max</label><input name="hum_min"><input name="hum_max"></div>
<div><label>Press min/max</label><input name="press_min"><input name="press_max"></div>
<div><label>Offsets T/H/P</label><input name="temp_offset"><input name="hum_offset"><input name="press_offset"></div>
<button type="submit">Save</button> <span id="msg"></span>
</form>
<script>
const N=30,hist={temp_aht20:[],hum_aht20:[],press_bmp280:[]};
const lim={temp_aht20:['temp_min','temp_max'],hum_aht20:['hum_min','hum_max'],press_bmp280:['press_min','press_max']};
let cfg={};
function draw(k){
  const c=document.getElementById('g-'+k),x=c.getContext('2d'),d=hist[k];
  c.width=c.clientWidth;c.height=c.clientHeight;
  const lo=cfg[lim[k][0]],hi=cfg[lim[k][1]];
  const vals=d.concat([lo,hi]).filter(v=>v!==undefined);
  const mn=Math.min(...vals)-1,mx=Math.max(...vals)+1,y=v=>c.height-(v-mn)/(mx-mn)*c.height;
  x.strokeStyle='#555';[lo,hi].forEach(v=>{if(v!==undefined){x.beginPath();x.moveTo(0,y(v));x.lineTo(c.width,y(v));x.stroke();}});
  x.strokeStyle='#5af';x.beginPath();
  d.forEach((v,i)=>{const px=i*c.width/(N-1);i?x.lineTo(px,y(v)):x.moveTo(px,y(v));});
  x.stroke();
}
async function loadCfg(){
  cfg=await (await fetch('/config')).json();
  for(const k in cfg){const i=document.querySelector('[name='+k+']');if(i)i.value=cfg[k];}
}
async function tick(){
  try{
    const j=await (await fetch('/json')).json();
    document.getElementById('now').textContent=
      `Temp: ${j.temp_aht20.toFixed(1)} C | Hum: ${j.hum_aht20.toFixed(1)} % | Press: ${j.press_bmp280.toFixed(1)} hPa`;
    for(const k in hist){hist[k].push(j[k]);if(hist[k].length>N)hist[k].shift();draw(k);}
  }catch(e){document.getElementById('now').textContent='Connection lost';}
}
document.getElementById('cfg').addEventListener('submit',async e=>{
  e.preventDefault();
  const body=new URLSearchParams(new FormData(e.target)).toString();
  const r=await (await fetch('/cfg',{method:'POST',headers:{'Content-Type':'application/x-www-form-urlencoded'},body})).json();
  document.getElementById('msg').textContent=r.message+(r.errors.length?': '+r.errors.map(x=>x.field+' '+x.error).join(', '):'');
  loadCfg();
});
loadCfg();tick();setInterval(tick,2000);
</script>
</body>
</html>
"##;

use anyhow::{anyhow, Context, Result};
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};
use log::info;

use wallpaper_manager_core::{Bitmap, CropRect, PlatformInfo, WallpaperLocation, WallpaperService};

/// `android.app.WallpaperManager` reached over JNI.
pub struct AndroidWallpaperService {
    vm: JavaVM,
    context: GlobalRef,
    platform: PlatformInfo,
}

impl AndroidWallpaperService {
    /// Binds to the application context published through `ndk_context`.
    pub fn from_ndk_context() -> Result<Self> {
        let ctx = ndk_context::android_context();
        let vm = unsafe { JavaVM::from_raw(ctx.vm() as _) }
            .context("Expected to find JVM via ndk_context crate")?;
        let activity = unsafe { JObject::from_raw(ctx.context() as _) };

        let (context, platform) = {
            let mut env = vm.attach_current_thread().context("Failed to attach current thread")?;
            let app_ctx = env
                .call_method(&activity, "getApplicationContext", "()Landroid/content/Context;", &[])
                .context("Failed to get application context")?
                .l()?;
            let context = env.new_global_ref(app_ctx).context("Failed to pin application context")?;
            let platform = read_platform(&mut env)?;
            (context, platform)
        };
        info!("Android wallpaper service on {} (SDK {:?})", platform.version_string(), platform.sdk_int);

        Ok(Self { vm, context, platform })
    }

    /// Application context shared with the asset resolver.
    pub fn context(&self) -> &GlobalRef {
        &self.context
    }

    pub fn vm(&self) -> &JavaVM {
        &self.vm
    }

    fn with_env<T>(&self, f: impl FnOnce(&mut JNIEnv) -> Result<T>) -> Result<T> {
        let mut env = self.vm.attach_current_thread().context("Failed to attach current thread")?;
        let result = f(&mut *env);
        clear_exception(&mut env);
        result
    }

    fn wallpaper_manager<'l>(&self, env: &mut JNIEnv<'l>) -> Result<JObject<'l>> {
        let manager = env
            .call_static_method(
                "android/app/WallpaperManager",
                "getInstance",
                "(Landroid/content/Context;)Landroid/app/WallpaperManager;",
                &[JValue::Object(self.context.as_obj())],
            )
            .context("Failed to get WallpaperManager instance")?
            .l()?;
        Ok(manager)
    }
}

impl WallpaperService for AndroidWallpaperService {
    fn platform(&self) -> PlatformInfo {
        self.platform.clone()
    }

    fn set_bitmap(
        &self,
        bitmap: &Bitmap,
        crop: Option<CropRect>,
        allow_backup: bool,
        location: WallpaperLocation,
    ) -> Result<i32> {
        self.with_env(|env| {
            let manager = self.wallpaper_manager(env)?;
            let jbitmap = to_android_bitmap(env, bitmap)?;
            let rect = match crop {
                Some(c) => env
                    .new_object(
                        "android/graphics/Rect",
                        "(IIII)V",
                        &[JValue::Int(c.left), JValue::Int(c.top), JValue::Int(c.right), JValue::Int(c.bottom)],
                    )
                    .context("Failed to create Rect")?,
                None => JObject::null(),
            };
            let id = env
                .call_method(
                    &manager,
                    "setBitmap",
                    "(Landroid/graphics/Bitmap;Landroid/graphics/Rect;ZI)I",
                    &[
                        JValue::Object(&jbitmap),
                        JValue::Object(&rect),
                        JValue::Bool(u8::from(allow_backup)),
                        JValue::Int(location.flags()),
                    ],
                )
                .context("WallpaperManager.setBitmap(bitmap, rect, allowBackup, which) failed")?
                .i()?;
            Ok(id)
        })
    }

    fn set_bitmap_legacy(&self, bitmap: &Bitmap) -> Result<()> {
        self.with_env(|env| {
            let manager = self.wallpaper_manager(env)?;
            let jbitmap = to_android_bitmap(env, bitmap)?;
            env.call_method(&manager, "setBitmap", "(Landroid/graphics/Bitmap;)V", &[JValue::Object(&jbitmap)])
                .context("WallpaperManager.setBitmap(bitmap) failed")?;
            Ok(())
        })
    }

    fn set_stream_legacy(&self, bytes: &[u8]) -> Result<()> {
        self.with_env(|env| {
            let manager = self.wallpaper_manager(env)?;
            let array = env.byte_array_from_slice(bytes).context("Failed to create Java byte array")?;
            let stream = env
                .new_object("java/io/ByteArrayInputStream", "([B)V", &[JValue::Object(&JObject::from(array))])
                .context("Failed to create ByteArrayInputStream")?;
            env.call_method(&manager, "setStream", "(Ljava/io/InputStream;)V", &[JValue::Object(&stream)])
                .context("WallpaperManager.setStream failed")?;
            Ok(())
        })
    }
}

/// Copies premultiplied RGBA pixels into a new `ARGB_8888` `android.graphics.Bitmap`.
fn to_android_bitmap<'l>(env: &mut JNIEnv<'l>, bitmap: &Bitmap) -> Result<JObject<'l>> {
    let width = i32::try_from(bitmap.width()).context("Bitmap too wide")?;
    let height = i32::try_from(bitmap.height()).context("Bitmap too tall")?;

    let config = env
        .get_static_field("android/graphics/Bitmap$Config", "ARGB_8888", "Landroid/graphics/Bitmap$Config;")
        .context("Failed to read Bitmap.Config.ARGB_8888")?
        .l()?;
    let jbitmap = env
        .call_static_method(
            "android/graphics/Bitmap",
            "createBitmap",
            "(IILandroid/graphics/Bitmap$Config;)Landroid/graphics/Bitmap;",
            &[JValue::Int(width), JValue::Int(height), JValue::Object(&config)],
        )
        .context("Failed to create Bitmap")?
        .l()?;
    if jbitmap.is_null() {
        return Err(anyhow!("Bitmap.createBitmap returned null for {}x{}", width, height));
    }

    let pixels = env
        .byte_array_from_slice(&bitmap.premultiplied_pixels())
        .context("Failed to create Java byte array")?;
    let buffer = env
        .call_static_method(
            "java/nio/ByteBuffer",
            "wrap",
            "([B)Ljava/nio/ByteBuffer;",
            &[JValue::Object(&JObject::from(pixels))],
        )
        .context("Failed to wrap pixel buffer")?
        .l()?;
    env.call_method(&jbitmap, "copyPixelsFromBuffer", "(Ljava/nio/Buffer;)V", &[JValue::Object(&buffer)])
        .context("Failed to copy pixels into Bitmap")?;
    Ok(jbitmap)
}

fn read_platform(env: &mut JNIEnv) -> Result<PlatformInfo> {
    let release = env
        .get_static_field("android/os/Build$VERSION", "RELEASE", "Ljava/lang/String;")
        .context("Failed to read Build.VERSION.RELEASE")?
        .l()?;
    let release: String = env.get_string(&JString::from(release))?.into();
    let sdk_int = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .context("Failed to read Build.VERSION.SDK_INT")?
        .i()?;
    Ok(PlatformInfo {
        name: "Android".to_string(),
        release,
        sdk_int: u32::try_from(sdk_int).ok(),
    })
}

/// Prints a pending Java exception's stack trace to logcat and clears it.
pub(crate) fn clear_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

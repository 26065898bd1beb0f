//! Password-reset email templates.

/// Subject line for reset notifications.
pub const RESET_SUBJECT: &str = "Password Reset Request - ClassTrack";

/// Reset link carrying the raw token as a query parameter. Tokens are
/// URL-safe by construction, so no escaping is applied here.
pub fn reset_link(app_url: &str, token: &str) -> String {
    format!("{app_url}?reset_token={token}")
}

/// Render the HTML and plain-text bodies for a reset notification.
pub fn reset_email(reset_link: &str, user_name: &str, expiry_minutes: i64) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1>Password Reset Request</h1>
  <p>Hello <strong>{user_name}</strong>,</p>
  <p>We received a request to reset the password for your ClassTrack account.</p>
  <p style="text-align: center; margin: 30px 0;">
    <a href="{reset_link}" style="background-color: #4a6fd0; color: white; padding: 12px 32px; text-decoration: none; border-radius: 4px;">Reset My Password</a>
  </p>
  <p style="font-size: 14px; color: #666;">Or copy and paste this link into your browser:</p>
  <p style="font-size: 12px; background-color: #eee; padding: 10px; word-break: break-all;">{reset_link}</p>
  <p style="font-size: 14px;"><strong>Important:</strong> this link expires in {expiry_minutes} minutes.</p>
  <p style="font-size: 14px; color: #666;">If you didn't request this reset, ignore this email; your password will remain unchanged.</p>
  <hr style="border: none; border-top: 1px solid #ddd;">
  <p style="font-size: 12px; color: #999;">This is an automated message from ClassTrack. Please do not reply.</p>
</body>
</html>
"#
    );

    let plain = format!(
        "Password Reset Request\n\
         \n\
         Hello {user_name},\n\
         \n\
         We received a request to reset the password for your ClassTrack account.\n\
         \n\
         Click the link below to reset your password:\n\
         {reset_link}\n\
         \n\
         IMPORTANT: this link expires in {expiry_minutes} minutes.\n\
         \n\
         If you didn't request this reset, ignore this email; your password will\n\
         remain unchanged.\n\
         \n\
         ---\n\
         This is an automated message from ClassTrack. Please do not reply.\n"
    );

    (html, plain)
}
